// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler: packs processed pages into one PDF using `printpdf` 0.8.
//
// Every page is sized to its image at 72 DPI, so one image pixel maps to one
// PDF point and nothing is scaled or cropped.

use std::path::{Path, PathBuf};

use ::image::DynamicImage;
use folioscan_core::error::FolioscanError;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;

/// Points per inch; pages are laid out at one pixel per point.
const PAGE_DPI: f32 = 72.0;

/// Quality at which pages are embedded without lossy rounding.
pub const LOSSLESS_QUALITY: u8 = 100;

/// Builds a PDF one page at a time, in the order pages are added.
///
/// ```ignore
/// let mut assembler = DocumentAssembler::new("Dune", 90);
/// for page in &pages {
///     assembler.add_page(page)?;
/// }
/// assembler.finish()?.write_to("Dune.pdf")?;
/// ```
pub struct DocumentAssembler {
    document: PdfDocument,
    pages: Vec<PdfPage>,
    quality: u8,
}

impl DocumentAssembler {
    /// Start a document titled `title`; `quality` above 100 is treated as 100.
    pub fn new(title: &str, quality: u8) -> Self {
        Self {
            document: PdfDocument::new(title),
            pages: Vec::new(),
            quality: quality.min(LOSSLESS_QUALITY),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append `image` as the next page.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn add_page(&mut self, image: &DynamicImage) -> Result<(), FolioscanError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FolioscanError::ImageError(
                "cannot place an empty image on a page".to_owned(),
            ));
        }

        let raw = prepare_page(image, self.quality)?;
        let (width_px, height_px) = (raw.width, raw.height);
        let xobject_id = self.document.add_image(&raw);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: None,
                scale_y: None,
                dpi: Some(PAGE_DPI),
                rotate: None,
            },
        }];

        self.pages.push(PdfPage::new(
            px_to_mm(width_px),
            px_to_mm(height_px),
            ops,
        ));
        debug!(page = self.pages.len(), "Page placed");
        Ok(())
    }

    /// Serialise the document. Fails with `EmptyInput` when no page was added.
    #[instrument(skip(self), fields(pages = self.pages.len(), quality = self.quality))]
    pub fn finish(mut self) -> Result<AssembledDocument, FolioscanError> {
        if self.pages.is_empty() {
            return Err(FolioscanError::EmptyInput);
        }

        let page_count = self.pages.len();
        self.document.with_pages(self.pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = self
            .document
            .save(&PdfSaveOptions::default(), &mut warnings);

        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation produced warnings");
        }
        info!(page_count, bytes = bytes.len(), "Document assembled");

        Ok(AssembledDocument { bytes, page_count })
    }
}

/// A serialised PDF ready to be written.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl AssembledDocument {
    /// Write the document to `path`, replacing any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), FolioscanError> {
        let path = path.as_ref();
        std::fs::write(path, &self.bytes).map_err(|source| FolioscanError::AssemblyIo {
            path: PathBuf::from(path),
            source,
        })?;
        info!("Wrote PDF to {}", path.display());
        Ok(())
    }
}

/// Assemble `images` into one document, one page per image, in order.
pub fn assemble(
    images: &[DynamicImage],
    title: &str,
    quality: u8,
) -> Result<AssembledDocument, FolioscanError> {
    let mut assembler = DocumentAssembler::new(title, quality);
    for image in images {
        assembler.add_page(image)?;
    }
    assembler.finish()
}

/// Apply quality rounding and convert to printpdf's raw pixel layout.
///
/// Single-channel pages stay single-channel; anything else is embedded as RGB.
fn prepare_page(image: &DynamicImage, quality: u8) -> Result<RawImage, FolioscanError> {
    let rounded;
    let image = if quality < LOSSLESS_QUALITY {
        rounded = ImageProcessor::from_dynamic(image.clone())
            .round_trip_jpeg(quality)?
            .into_dynamic();
        &rounded
    } else {
        image
    };

    let width = image.width() as usize;
    let height = image.height() as usize;
    let (data, data_format) = match image {
        DynamicImage::ImageLuma8(gray) => (gray.as_raw().clone(), RawImageFormat::R8),
        other => (other.to_rgb8().into_raw(), RawImageFormat::RGB8),
    };

    Ok(RawImage {
        pixels: RawImageData::U8(data),
        width,
        height,
        data_format,
        tag: Vec::new(),
    })
}

fn px_to_mm(px: usize) -> Mm {
    Mm(px as f32 * 25.4 / PAGE_DPI)
}
