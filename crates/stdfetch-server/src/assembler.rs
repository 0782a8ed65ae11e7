//! PDF assembly from fetched page images.
//!
//! Each image becomes one page: decoded with `image`, embedded as a
//! Flate-compressed 8-bit XObject and drawn over the full page. Page size
//! follows the pixel size at 96 dpi.

use std::io;
use std::path::{Path, PathBuf};

use image::ImageReader;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use thiserror::Error;
use tracing::debug;

use stdfetch_core::TaskError;

/// Points per pixel at 96 dpi.
const PT_PER_PX: f32 = 72.0 / 96.0;

/// Errors assembling the output document.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// No page images to assemble.
    #[error("no page images to assemble")]
    NoPages,

    /// A page image could not be decoded.
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// PDF object construction or encoding failed.
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Writing the document failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<AssembleError> for TaskError {
    fn from(err: AssembleError) -> Self {
        match err {
            AssembleError::NoPages => TaskError::NoContent,
            other => TaskError::Assembly(other.to_string()),
        }
    }
}

/// List the `*.png` page files in `dir`, sorted by file name.
///
/// The zero-padded naming makes this page order.
pub fn list_page_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "png"))
        .collect();
    files.sort();
    Ok(files)
}

/// Build a PDF with one page per image, in the given order.
pub fn build_document(files: &[PathBuf]) -> Result<Document, AssembleError> {
    if files.is_empty() {
        return Err(AssembleError::NoPages);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(files.len());

    for path in files {
        // Hosts are not strict about content types, so sniff the format.
        let img = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.decode())
            .map_err(|source| AssembleError::Decode {
                path: path.clone(),
                source,
            })?;
        let (width, height) = (img.width(), img.height());
        let (color_space, pixels) = if img.color().has_color() {
            ("DeviceRGB", img.to_rgb8().into_raw())
        } else {
            ("DeviceGray", img.to_luma8().into_raw())
        };

        let mut image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
            },
            pixels,
        );
        image_stream.compress()?;
        let image_id = doc.add_object(image_stream);

        let page_width = width as f32 * PT_PER_PX;
        let page_height = height as f32 * PT_PER_PX;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_width.into(),
                        0.into(),
                        0.into(),
                        page_height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());

        debug!(page = %path.display(), width, height, "Page embedded");
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

/// Assemble `files` into a PDF at `output`. Returns the page count.
pub fn assemble(files: &[PathBuf], output: &Path) -> Result<usize, AssembleError> {
    let mut doc = build_document(files)?;
    doc.save(output)?;
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn media_box_width(doc: &Document, page_id: lopdf::ObjectId) -> f32 {
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        media_box[2].as_float().unwrap()
    }

    #[test]
    fn test_list_page_files_sorted_png_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["00010.png", "00002.png", "00001.png", "00003.png.part", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let files = list_page_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["00001.png", "00002.png", "00010.png"]);
    }

    #[test]
    fn test_assemble_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("00001.png");
        let second = dir.path().join("00003.png");
        RgbImage::from_pixel(96, 48, Rgb([255, 0, 0])).save(&first).unwrap();
        GrayImage::from_pixel(192, 48, Luma([128])).save(&second).unwrap();

        let output = dir.path().join("out.pdf");
        let pages = assemble(&[first, second], &output).unwrap();
        assert_eq!(pages, 2);

        let doc = Document::load(&output).unwrap();
        let page_ids: Vec<_> = doc.get_pages().into_values().collect();
        assert_eq!(page_ids.len(), 2);
        assert_eq!(media_box_width(&doc, page_ids[0]), 72.0);
        assert_eq!(media_box_width(&doc, page_ids[1]), 144.0);
    }

    #[test]
    fn test_empty_input_is_no_pages() {
        let dir = tempfile::tempdir().unwrap();
        let err = assemble(&[], &dir.path().join("out.pdf")).unwrap_err();
        assert!(matches!(err, AssembleError::NoPages));
        assert_eq!(TaskError::from(err), TaskError::NoContent);
    }

    #[test]
    fn test_corrupt_image_is_assembly_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("00001.png");
        std::fs::write(&bad, b"definitely not a png").unwrap();

        let err = assemble(&[bad], &dir.path().join("out.pdf")).unwrap_err();
        assert!(matches!(err, AssembleError::Decode { .. }));
        assert!(matches!(TaskError::from(err), TaskError::Assembly(_)));
    }
}
