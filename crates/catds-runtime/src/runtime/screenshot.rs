use std::{fs::File, io::BufWriter, path::Path};

use catds_core::screen::{BYTES_PER_PIXEL, FRAME_HEIGHT, SCREEN_WIDTH};

use super::frame::FrameSnapshot;

/// Writes `snapshot` as an 8-bit RGB PNG at native resolution (both screens,
/// top first). The padding alpha channel is dropped.
pub fn write_png(path: &Path, snapshot: &FrameSnapshot) -> Result<(), png::EncodingError> {
    let rgb: Vec<u8> = snapshot
        .pixels()
        .chunks_exact(BYTES_PER_PIXEL)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        SCREEN_WIDTH as u32,
        FRAME_HEIGHT as u32,
    );
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgb)?;
    writer.finish()?;
    Ok(())
}
