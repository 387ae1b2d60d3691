//! Image XObject extraction
//!
//! Walks a page's resource dictionary (inherited through the page tree and
//! nested form XObjects) and returns each distinct image stream in
//! dictionary order. JPEG and JPEG 2000 streams are passed through
//! untouched; everything else is decoded to samples and re-encoded as PNG.

use std::collections::HashSet;
use std::io::Cursor;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document as ObjectTree, Object, ObjectId, Stream};

use crate::document::{DocumentError, DocumentResult, EmbeddedImage};

const MAX_PARENT_DEPTH: usize = 32;
const MAX_FORM_DEPTH: usize = 8;

/// Images drawn on page `page_index`, one entry per distinct stream
///
/// The outer error means the page could not be walked at all; inner errors
/// belong to single images.
pub fn page_images(
    tree: &ObjectTree,
    page_index: usize,
) -> DocumentResult<Vec<DocumentResult<EmbeddedImage>>> {
    let page_id = tree
        .get_pages()
        .values()
        .nth(page_index)
        .copied()
        .ok_or_else(|| {
            DocumentError::ExtractionError(format!("page {} missing from page tree", page_index))
        })?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    if let Some(resources) = page_resources(tree, page_id)? {
        collect(tree, resources, &mut seen, &mut out, 0)?;
    }
    Ok(out)
}

fn resolve<'a>(tree: &'a ObjectTree, obj: &'a Object) -> DocumentResult<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(tree.get_object(*id)?),
        other => Ok(other),
    }
}

fn resolve_dict<'a>(tree: &'a ObjectTree, obj: &'a Object) -> DocumentResult<&'a Dictionary> {
    match resolve(tree, obj)? {
        Object::Dictionary(dict) => Ok(dict),
        Object::Stream(stream) => Ok(&stream.dict),
        _ => Err(DocumentError::ExtractionError(
            "expected a dictionary object".into(),
        )),
    }
}

/// Resources of the page, falling back to the nearest ancestor that has them
fn page_resources(tree: &ObjectTree, page_id: ObjectId) -> DocumentResult<Option<&Dictionary>> {
    let mut node = tree.get_dictionary(page_id)?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dict(tree, resources).map(Some);
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => node = tree.get_dictionary(*parent)?,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

fn collect(
    tree: &ObjectTree,
    resources: &Dictionary,
    seen: &mut HashSet<ObjectId>,
    out: &mut Vec<DocumentResult<EmbeddedImage>>,
    depth: usize,
) -> DocumentResult<()> {
    let xobjects = match resources.get(b"XObject") {
        Ok(obj) => resolve_dict(tree, obj)?,
        Err(_) => return Ok(()),
    };

    for (name, value) in xobjects.iter() {
        // XObjects must be indirect; anything else is malformed and skipped
        let Object::Reference(id) = value else {
            continue;
        };
        if !seen.insert(*id) {
            continue;
        }

        let stream = match tree.get_object(*id) {
            Ok(Object::Stream(stream)) => stream,
            Ok(_) => continue,
            Err(e) => {
                out.push(Err(DocumentError::ExtractionError(format!(
                    "XObject {} unreadable: {}",
                    String::from_utf8_lossy(name),
                    e
                ))));
                continue;
            }
        };

        match name_of(&stream.dict, b"Subtype") {
            Some(b"Image") => out.push(decode_image(tree, *id, stream)),
            Some(b"Form") if depth < MAX_FORM_DEPTH => {
                if let Ok(nested) = stream.dict.get(b"Resources") {
                    let nested = resolve_dict(tree, nested)?;
                    collect(tree, nested, seen, out, depth + 1)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn name_of<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key) {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

fn int_of(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict.get(key) {
        Ok(Object::Integer(value)) => Some(*value),
        Ok(Object::Real(value)) => Some(*value as i64),
        _ => None,
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> DocumentResult<u32> {
    int_of(dict, key)
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            DocumentError::ExtractionError(format!(
                "image has no valid /{}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| match o {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_image(tree: &ObjectTree, id: ObjectId, stream: &Stream) -> DocumentResult<EmbeddedImage> {
    let width = dimension(&stream.dict, b"Width")?;
    let height = dimension(&stream.dict, b"Height")?;
    let filters = filters(&stream.dict);

    let passthrough = match filters.as_slice() {
        [only] if only == b"DCTDecode" => Some("jpeg"),
        [only] if only == b"JPXDecode" => Some("jpx"),
        _ => None,
    };
    if let Some(ext) = passthrough {
        return Ok(EmbeddedImage {
            xref: id.0,
            ext: ext.to_string(),
            bytes: stream.content.clone(),
            width,
            height,
        });
    }

    for filter in &filters {
        if matches!(
            filter.as_slice(),
            b"DCTDecode" | b"JPXDecode" | b"JBIG2Decode" | b"CCITTFaxDecode"
        ) {
            return Err(DocumentError::ExtractionError(format!(
                "image {} uses unsupported filter chain ending in {}",
                id.0,
                String::from_utf8_lossy(filter)
            )));
        }
    }

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream.decompressed_content()?
    };

    let image = samples_to_image(tree, &stream.dict, width, height, &samples)?;
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;

    Ok(EmbeddedImage {
        xref: id.0,
        ext: "png".to_string(),
        bytes: png,
        width,
        height,
    })
}

/// Colour model of an image stream
#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    Indexed { base: Box<ColorModel>, palette: Vec<u8> },
}

impl ColorModel {
    fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed { .. } => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }

    fn from_components(n: i64) -> DocumentResult<Self> {
        match n {
            1 => Ok(ColorModel::Gray),
            3 => Ok(ColorModel::Rgb),
            4 => Ok(ColorModel::Cmyk),
            other => Err(DocumentError::ExtractionError(format!(
                "ICC profile with {} components",
                other
            ))),
        }
    }

    fn parse(tree: &ObjectTree, obj: &Object) -> DocumentResult<Self> {
        match resolve(tree, obj)? {
            Object::Name(name) => Self::from_name(name),
            Object::Array(items) => {
                let family = match items.first() {
                    Some(Object::Name(name)) => name.as_slice(),
                    _ => {
                        return Err(DocumentError::ExtractionError(
                            "colour space array without family".into(),
                        ))
                    }
                };
                match family {
                    b"ICCBased" => {
                        let profile = items.get(1).ok_or_else(|| {
                            DocumentError::ExtractionError("ICCBased without profile".into())
                        })?;
                        let dict = resolve_dict(tree, profile)?;
                        Self::from_components(int_of(dict, b"N").unwrap_or(3))
                    }
                    b"Indexed" | b"I" => {
                        let (Some(base), Some(lookup)) = (items.get(1), items.get(3)) else {
                            return Err(DocumentError::ExtractionError(
                                "Indexed colour space is incomplete".into(),
                            ));
                        };
                        let base = Self::parse(tree, base)?;
                        if matches!(base, ColorModel::Indexed { .. }) {
                            return Err(DocumentError::ExtractionError(
                                "nested Indexed colour space".into(),
                            ));
                        }
                        let palette = match resolve(tree, lookup)? {
                            Object::String(bytes, _) => bytes.clone(),
                            Object::Stream(stream) => stream
                                .decompressed_content()
                                .unwrap_or_else(|_| stream.content.clone()),
                            _ => {
                                return Err(DocumentError::ExtractionError(
                                    "Indexed lookup table is not a string or stream".into(),
                                ))
                            }
                        };
                        Ok(ColorModel::Indexed {
                            base: Box::new(base),
                            palette,
                        })
                    }
                    b"CalGray" => Ok(ColorModel::Gray),
                    b"CalRGB" | b"Lab" => Ok(ColorModel::Rgb),
                    other => Self::from_name(other),
                }
            }
            _ => Err(DocumentError::ExtractionError(
                "colour space is neither a name nor an array".into(),
            )),
        }
    }

    fn from_name(name: &[u8]) -> DocumentResult<Self> {
        match name {
            b"DeviceGray" | b"G" | b"CalGray" => Ok(ColorModel::Gray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Ok(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
            other => Err(DocumentError::ExtractionError(format!(
                "unsupported colour space {}",
                String::from_utf8_lossy(other)
            ))),
        }
    }
}

fn samples_to_image(
    tree: &ObjectTree,
    dict: &Dictionary,
    width: u32,
    height: u32,
    samples: &[u8],
) -> DocumentResult<DynamicImage> {
    let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let (model, bpc) = if is_mask {
        (ColorModel::Gray, 1)
    } else {
        let model = match dict.get(b"ColorSpace") {
            Ok(obj) => ColorModel::parse(tree, obj)?,
            Err(_) => {
                return Err(DocumentError::ExtractionError(
                    "image has no /ColorSpace".into(),
                ))
            }
        };
        let bpc = int_of(dict, b"BitsPerComponent").unwrap_or(8);
        (model, bpc)
    };

    let bpc = match bpc {
        1 | 2 | 4 | 8 | 16 => bpc as u8,
        other => {
            return Err(DocumentError::ExtractionError(format!(
                "unsupported BitsPerComponent {}",
                other
            )))
        }
    };

    let indexed = matches!(model, ColorModel::Indexed { .. });
    let values = unpack_samples(
        samples,
        width as usize,
        height as usize,
        model.components(),
        bpc,
        !indexed,
    )?;

    build_image(&model, width, height, values)
}

/// Unpack rows of `bpc`-bit samples into one byte per sample
///
/// With `normalize` the values are stretched to 0..=255; otherwise they are
/// returned as raw integers (palette indices).
fn unpack_samples(
    data: &[u8],
    width: usize,
    height: usize,
    components: usize,
    bpc: u8,
    normalize: bool,
) -> DocumentResult<Vec<u8>> {
    let per_row = width * components;
    let row_bytes = (per_row * bpc as usize + 7) / 8;
    if data.len() < row_bytes * height {
        return Err(DocumentError::ExtractionError(format!(
            "image data truncated: {} bytes, expected {}",
            data.len(),
            row_bytes * height
        )));
    }

    let max = (1u32 << bpc.min(8)) - 1;
    let mut out = Vec::with_capacity(per_row * height);
    for row in data.chunks_exact(row_bytes).take(height) {
        for i in 0..per_row {
            let value = match bpc {
                8 => u32::from(row[i]),
                16 => u32::from(row[i * 2]),
                _ => {
                    let bit = i * bpc as usize;
                    let shift = 8 - bpc as usize - (bit % 8);
                    (u32::from(row[bit / 8]) >> shift) & max
                }
            };
            let value = if normalize && bpc < 8 {
                value * 255 / max
            } else {
                value
            };
            out.push(value as u8);
        }
    }

    Ok(out)
}

fn cmyk_to_rgb(px: &[u8]) -> [u8; 3] {
    let k = 255 - u32::from(px[3]);
    let channel = |c: u8| ((255 - u32::from(c)) * k / 255) as u8;
    [channel(px[0]), channel(px[1]), channel(px[2])]
}

fn build_image(
    model: &ColorModel,
    width: u32,
    height: u32,
    values: Vec<u8>,
) -> DocumentResult<DynamicImage> {
    let buffer_error = || DocumentError::ImageError("sample buffer does not match dimensions".into());

    match model {
        ColorModel::Gray => GrayImage::from_raw(width, height, values)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(buffer_error),
        ColorModel::Rgb => RgbImage::from_raw(width, height, values)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(buffer_error),
        ColorModel::Cmyk => {
            let rgb = values.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(buffer_error)
        }
        ColorModel::Indexed { base, palette } => {
            let n = base.components();
            let entries = palette.len() / n;
            if entries == 0 {
                return Err(DocumentError::ExtractionError("empty palette".into()));
            }
            let lookup = |index: u8| {
                let index = (index as usize).min(entries - 1);
                &palette[index * n..index * n + n]
            };
            let rgb = values
                .iter()
                .flat_map(|&index| {
                    let entry = lookup(index);
                    match **base {
                        ColorModel::Gray => [entry[0]; 3],
                        ColorModel::Cmyk => cmyk_to_rgb(entry),
                        _ => [entry[0], entry[1], entry[2]],
                    }
                })
                .collect();
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(buffer_error)
        }
    }
}
