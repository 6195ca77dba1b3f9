//! Stereo (3D) format descriptors and the 3D panel interface.
//!
//! Producers pack stereo layout metadata into the high bits of a buffer
//! format code: an input-layout field saying how the eyes are packed in
//! the source, and an output-layout field saying how the panel should
//! present them. The display pipeline and the panel firmware each expect
//! both fields, so encoding fills in whichever half the producer left
//! empty.

use log::{info, warn};

use crate::device::{
    DisplayDevice, PanelKind, Platform, BARRIER_3D_PATH, EDID_3D_PATH, FORMAT_3D_PATH,
};
use crate::format::BufferFormat;

/// Input-layout codes, bits 16..20 of a buffer format.
pub const IN_SIDE_BY_SIDE_L_R: u32 = 0x10000;
pub const IN_TOP_BOTTOM: u32 = 0x20000;
pub const IN_INTERLEAVE: u32 = 0x40000;
pub const IN_SIDE_BY_SIDE_R_L: u32 = 0x80000;

/// Output-layout codes, bits 12..16.
pub const OUT_SIDE_BY_SIDE: u32 = 0x1000;
pub const OUT_TOP_BOTTOM: u32 = 0x2000;
pub const OUT_INTERLEAVE: u32 = 0x4000;
pub const OUT_MONOSCOPIC: u32 = 0x8000;

const INPUT_MASK: u32 = 0xF0000;
const OUTPUT_MASK: u32 = 0xF000;
/// Bit distance between the input and output layout fields.
const FIELD_SHIFT: u32 = 4;

/// Extracts the packed stereo descriptor of a buffer format, deriving the
/// missing half when the producer declared only one field.
///
/// Side-by-side input always maps to the canonical side-by-side output
/// code, whichever eye comes first; other input layouts mirror across
/// the field boundary. Returns 0 for content with no stereo metadata.
pub fn encode(format: BufferFormat) -> u32 {
    // YV12's fourcc aliases the 3D bit ranges; its stereo layout is
    // signaled out of band.
    if format == BufferFormat::YV12 {
        return 0;
    }
    let raw = format.raw();
    let input = raw & INPUT_MASK;
    let output = raw & OUTPUT_MASK;
    let mut descriptor = input | output;
    if input == 0 {
        descriptor |= output << FIELD_SHIFT;
    }
    if output == 0 {
        match input {
            IN_SIDE_BY_SIDE_L_R | IN_SIDE_BY_SIDE_R_L => {
                descriptor |= IN_SIDE_BY_SIDE_L_R >> FIELD_SHIFT;
            }
            _ => {
                descriptor |= input >> FIELD_SHIFT;
            }
        }
    }
    descriptor
}

/// Splits a packed descriptor into its input and output layout codes.
pub fn decode(descriptor: u32) -> (u32, u32) {
    (descriptor & INPUT_MASK, descriptor & OUTPUT_MASK)
}

/// True when the external display advertises 3D support in its EDID.
pub fn is_3d_tv(platform: &dyn Platform) -> bool {
    match platform.read_file(EDID_3D_PATH) {
        Some(contents) => {
            let flag = contents.bytes().next().unwrap_or(b'0');
            info!("3D TV EDID flag: {}", flag as char);
            flag != b'0'
        }
        None => false,
    }
}

/// True when the primary panel itself is a 3D panel.
pub fn is_panel_3d(device: &dyn DisplayDevice) -> bool {
    match device.panel_kind() {
        Ok(kind) => kind == PanelKind::Stereo3d,
        Err(err) => {
            warn!("panel kind query failed: {err}");
            false
        }
    }
}

/// Pushes a packed 3D format descriptor to the panel driver.
pub fn send_3d_config(platform: &dyn Platform, descriptor: u32) -> bool {
    if !platform.write_file(FORMAT_3D_PATH, &descriptor.to_string()) {
        warn!("no sysfs entry for setting the panel 3D mode");
        return false;
    }
    true
}

/// Drives the parallax barrier for the given display orientation.
pub fn enable_barrier(platform: &dyn Platform, orientation: u32) -> bool {
    if !platform.write_file(BARRIER_3D_PATH, &orientation.to_string()) {
        warn!("no sysfs entry for enabling the 3D panel barrier");
        return false;
    }
    true
}
