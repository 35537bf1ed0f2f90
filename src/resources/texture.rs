use crate::device::ImageData;

/// Decode PNG, JPEG, GIF or BMP bytes into RGBA8 pixels, top row first.
pub fn decode_image(bytes: &[u8]) -> anyhow::Result<ImageData> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageData::new(width, height, rgba.into_raw())
}
