//! Input report layouts.
//!
//! A [`ReportLayout`] says where each [`RawAxis`] and button sits inside one input report, in
//! bits. The hidapi backend builds it from the device's HID report descriptor with
//! [`ReportLayout::from_descriptor`] and falls back to [`ReportLayout::fixed_joystick`] only
//! when the descriptor can't be read or describes nothing usable.
//!
//! Reports are taken as hidapi delivers them: the first byte is a report ID only when the
//! device numbers its reports (the descriptor carries a Report ID item).
//!
//! Axis values are rescaled from the field's logical range onto the signed 16-bit range, so
//! a `0..=65535` steering axis and a `-127..=127` stick both land in `-32768..=32767`.
//!
//! Recognised controls:
//! - Generic Desktop X, Y, Z, Rz
//! - Simulation Controls Steering (X), Accelerator (Y), Brake (Rz)
//! - Button page, one bit per button, button `n` from usage `n + 1`

use crate::error::DeviceError;
use crate::format::DataFormat;
use crate::state::{RawAxis, RawState, AXIS_COUNT, BUTTON_COUNT};
use std::collections::BTreeMap;

const AXIS_OUT_MIN: i64 = i16::MIN as i64;
const AXIS_OUT_MAX: i64 = i16::MAX as i64;

const PAGE_GENERIC_DESKTOP: u16 = 0x01;
const PAGE_SIMULATION: u16 = 0x02;
const PAGE_BUTTON: u16 = 0x09;

// Item types and tags (HID 1.11, section 6.2.2).
const ITEM_MAIN: u8 = 0;
const ITEM_GLOBAL: u8 = 1;
const ITEM_LOCAL: u8 = 2;
const LONG_ITEM_PREFIX: u8 = 0xFE;
const TAG_INPUT: u8 = 0x8;

const INPUT_CONSTANT: u32 = 0x01;
const INPUT_VARIABLE: u32 = 0x02;

fn axis_for_usage(page: u16, usage: u16) -> Option<RawAxis> {
    match (page, usage) {
        (PAGE_GENERIC_DESKTOP, 0x30) => Some(RawAxis::X),
        (PAGE_GENERIC_DESKTOP, 0x31) => Some(RawAxis::Y),
        (PAGE_GENERIC_DESKTOP, 0x32) => Some(RawAxis::Z),
        (PAGE_GENERIC_DESKTOP, 0x35) => Some(RawAxis::Rz),
        (PAGE_SIMULATION, 0xC8) => Some(RawAxis::X),
        (PAGE_SIMULATION, 0xC4) => Some(RawAxis::Y),
        (PAGE_SIMULATION, 0xC5) => Some(RawAxis::Rz),
        _ => None,
    }
}

/// One axis field inside a report payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueField {
    pub bit_offset: usize,
    pub bit_size: usize,
    pub logical_min: i64,
    pub logical_max: i64,
}

impl ValueField {
    fn read(&self, payload: &[u8]) -> i32 {
        let raw = read_bits(payload, self.bit_offset, self.bit_size);
        let value = if self.logical_min < 0 {
            sign_extend(raw, self.bit_size)
        } else {
            raw as i64
        };
        self.scale(value)
    }

    fn scale(&self, value: i64) -> i32 {
        let span = self.logical_max - self.logical_min;
        if span <= 0 {
            return 0;
        }
        let scaled =
            AXIS_OUT_MIN + (value - self.logical_min) * (AXIS_OUT_MAX - AXIS_OUT_MIN) / span;
        scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

/// A run of consecutive one-bit buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonField {
    pub bit_offset: usize,
    pub first_button: usize,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportLayout {
    report_id: Option<u8>,
    axes: [Option<ValueField>; AXIS_COUNT],
    buttons: Vec<ButtonField>,
    payload_bits: usize,
}

impl ReportLayout {
    /// Unnumbered report: X, Y, Z, Rz as little-endian `i16`, then a 32-button bitmap.
    pub fn fixed_joystick() -> Self {
        let axis = |slot: usize| {
            Some(ValueField {
                bit_offset: slot * 16,
                bit_size: 16,
                logical_min: AXIS_OUT_MIN,
                logical_max: AXIS_OUT_MAX,
            })
        };
        Self {
            report_id: None,
            axes: [axis(0), axis(1), axis(2), axis(3)],
            buttons: vec![ButtonField {
                bit_offset: 64,
                first_button: 0,
                count: BUTTON_COUNT,
            }],
            payload_bits: 64 + BUTTON_COUNT,
        }
    }

    /// Derive the layout from a HID report descriptor.
    ///
    /// When the descriptor declares several input reports, the one carrying the most
    /// recognised controls wins (lowest report ID on ties).
    pub fn from_descriptor(descriptor: &[u8]) -> Result<Self, DeviceError> {
        let mut globals = Globals::default();
        let mut stack: Vec<Globals> = Vec::new();
        let mut locals = Locals::default();
        let mut reports: BTreeMap<u8, ReportBuilder> = BTreeMap::new();

        let mut pos = 0;
        while pos < descriptor.len() {
            let prefix = descriptor[pos];
            if prefix == LONG_ITEM_PREFIX {
                let len = descriptor.get(pos + 1).copied().map_or(0, usize::from);
                pos += 3 + len;
                continue;
            }

            let size = match prefix & 0x03 {
                3 => 4,
                n => usize::from(n),
            };
            let Some(data) = descriptor.get(pos + 1..pos + 1 + size) else {
                return Err(DeviceError::Report(format!(
                    "report descriptor truncated at byte {pos}"
                )));
            };
            pos += 1 + size;

            let unsigned = data
                .iter()
                .rev()
                .fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
            let signed = sign_extend(u64::from(unsigned), size * 8);
            let tag = prefix >> 4;

            match (prefix >> 2) & 0x03 {
                ITEM_MAIN => {
                    if tag == TAG_INPUT {
                        reports
                            .entry(globals.report_id)
                            .or_default()
                            .add_input(&globals, &locals, unsigned);
                    }
                    locals = Locals::default();
                }
                ITEM_GLOBAL => match tag {
                    0x0 => globals.usage_page = unsigned as u16,
                    0x1 => globals.logical_min = signed,
                    // Many descriptors encode an unsigned maximum in too few bytes.
                    0x2 if signed < globals.logical_min => {
                        globals.logical_max = i64::from(unsigned)
                    }
                    0x2 => globals.logical_max = signed,
                    0x7 => globals.report_size = unsigned as usize,
                    0x8 => globals.report_id = unsigned as u8,
                    0x9 => globals.report_count = unsigned as usize,
                    0xA => stack.push(globals),
                    0xB => {
                        if let Some(saved) = stack.pop() {
                            globals = saved;
                        }
                    }
                    _ => {}
                },
                ITEM_LOCAL => match tag {
                    0x0 => locals.usages.push(usage(globals.usage_page, unsigned, size)),
                    0x1 => locals.usage_min = Some(usage(globals.usage_page, unsigned, size)),
                    0x2 => locals.usage_max = Some(usage(globals.usage_page, unsigned, size).1),
                    _ => {}
                },
                _ => {}
            }
        }

        let mut chosen: Option<(u8, ReportBuilder)> = None;
        for (id, report) in reports {
            let worse = chosen
                .as_ref()
                .is_some_and(|(_, best)| report.score() <= best.score());
            if !worse {
                chosen = Some((id, report));
            }
        }
        let Some((id, report)) = chosen.filter(|(_, r)| r.score() > 0) else {
            return Err(DeviceError::Report(
                "report descriptor declares no axes or buttons".into(),
            ));
        };

        Ok(Self {
            report_id: (id != 0).then_some(id),
            axes: report.axes,
            buttons: report.buttons,
            payload_bits: report.bits,
        })
    }

    /// Report ID prefixing every input report, `None` for unnumbered reports.
    #[inline]
    pub fn report_id(&self) -> Option<u8> {
        self.report_id
    }

    pub fn axis(&self, axis: RawAxis) -> Option<&ValueField> {
        self.axes[axis.index()].as_ref()
    }

    pub fn buttons(&self) -> &[ButtonField] {
        &self.buttons
    }

    pub fn axis_count(&self) -> usize {
        self.axes.iter().flatten().count()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.iter().map(|b| b.count).sum()
    }

    /// Payload bytes one report must carry (excludes the report ID).
    pub fn payload_len(&self) -> usize {
        self.payload_bits.div_ceil(8)
    }

    /// Bytes one read must return, including the report ID when present.
    pub fn report_len(&self) -> usize {
        self.payload_len() + usize::from(self.report_id.is_some())
    }

    /// Keep only the controls `format` asks for.
    pub fn restrict(&self, format: &DataFormat) -> Self {
        let mut axes = self.axes;
        for axis in RawAxis::ALL {
            if !format.includes_axis(axis) {
                axes[axis.index()] = None;
            }
        }
        let limit = format.button_count();
        let buttons = self
            .buttons
            .iter()
            .filter(|b| b.first_button < limit)
            .map(|b| ButtonField {
                count: b.count.min(limit - b.first_button),
                ..*b
            })
            .collect();
        Self {
            report_id: self.report_id,
            axes,
            buttons,
            payload_bits: self.payload_bits,
        }
    }

    /// Decode one report into `out`.
    ///
    /// Reports with another report ID or too few bytes are rejected and `out` is left
    /// untouched. Controls the layout doesn't carry read as centered/released.
    pub fn decode(&self, report: &[u8], out: &mut RawState) -> Result<(), DeviceError> {
        let payload = match self.report_id {
            None => report,
            Some(id) => match report.split_first() {
                Some((&first, rest)) if first == id => rest,
                Some((&first, _)) => {
                    return Err(DeviceError::Report(format!(
                        "report id {first:#04x}, expected {id:#04x}"
                    )))
                }
                None => return Err(DeviceError::Report("empty report".into())),
            },
        };
        if payload.len() < self.payload_len() {
            return Err(DeviceError::Report(format!(
                "expected {} payload bytes, got {}",
                self.payload_len(),
                payload.len()
            )));
        }

        let mut decoded = RawState::default();
        for axis in RawAxis::ALL {
            if let Some(field) = self.axis(axis) {
                decoded.set_axis(axis, field.read(payload));
            }
        }
        for field in &self.buttons {
            for i in 0..field.count {
                let pressed = read_bits(payload, field.bit_offset + i, 1) != 0;
                decoded.set_button(field.first_button + i, pressed);
            }
        }

        *out = decoded;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Globals {
    usage_page: u16,
    logical_min: i64,
    logical_max: i64,
    report_size: usize,
    report_count: usize,
    report_id: u8,
}

#[derive(Debug, Default)]
struct Locals {
    usages: Vec<(u16, u16)>,
    usage_min: Option<(u16, u16)>,
    usage_max: Option<u16>,
}

impl Locals {
    /// Usage of the `index`-th field of a main item. The last listed usage repeats.
    fn usage(&self, index: usize) -> Option<(u16, u16)> {
        if let Some(last) = self.usages.len().checked_sub(1) {
            return self.usages.get(index.min(last)).copied();
        }
        let (page, min) = self.usage_min?;
        let max = self.usage_max?;
        let id = u16::try_from(index).ok().and_then(|i| min.checked_add(i))?;
        (id <= max).then_some((page, id))
    }
}

#[derive(Debug, Default)]
struct ReportBuilder {
    axes: [Option<ValueField>; AXIS_COUNT],
    buttons: Vec<ButtonField>,
    bits: usize,
}

impl ReportBuilder {
    fn score(&self) -> usize {
        self.axes.iter().flatten().count() + self.buttons.iter().map(|b| b.count).sum::<usize>()
    }

    fn add_input(&mut self, globals: &Globals, locals: &Locals, flags: u32) {
        let size = globals.report_size;
        let start = self.bits;
        self.bits += size * globals.report_count;

        // Padding and array fields carry nothing this layout can place.
        if flags & INPUT_CONSTANT != 0 || flags & INPUT_VARIABLE == 0 {
            return;
        }
        for index in 0..globals.report_count {
            let Some((page, id)) = locals.usage(index) else {
                continue;
            };
            let bit_offset = start + index * size;
            if page == PAGE_BUTTON && size == 1 {
                if id > 0 {
                    self.push_button(bit_offset, usize::from(id - 1));
                }
            } else if let Some(axis) = axis_for_usage(page, id) {
                let slot = &mut self.axes[axis.index()];
                if slot.is_none() && (1..=32).contains(&size) {
                    *slot = Some(ValueField {
                        bit_offset,
                        bit_size: size,
                        logical_min: globals.logical_min,
                        logical_max: globals.logical_max,
                    });
                }
            }
        }
    }

    fn push_button(&mut self, bit_offset: usize, button: usize) {
        if let Some(run) = self.buttons.last_mut() {
            if run.bit_offset + run.count == bit_offset && run.first_button + run.count == button {
                run.count += 1;
                return;
            }
        }
        self.buttons.push(ButtonField {
            bit_offset,
            first_button: button,
            count: 1,
        });
    }
}

fn usage(page: u16, data: u32, size: usize) -> (u16, u16) {
    if size == 4 {
        ((data >> 16) as u16, data as u16)
    } else {
        (page, data as u16)
    }
}

/// Little-endian bit field; bits past the end of `payload` read as zero.
fn read_bits(payload: &[u8], offset: usize, size: usize) -> u64 {
    let mut value = 0u64;
    for i in 0..size {
        let bit = offset + i;
        let byte = payload.get(bit / 8).copied().unwrap_or(0);
        if byte & (1u8 << (bit % 8)) != 0 {
            value |= 1u64 << i;
        }
    }
    value
}

fn sign_extend(raw: u64, bits: usize) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const WHEEL: &[u8] = &[
        0x05, 0x01,                   // Usage Page (Generic Desktop)
        0x09, 0x04,                   // Usage (Joystick)
        0xA1, 0x01,                   // Collection (Application)
        0x85, 0x01,                   //   Report ID (1)
        0x05, 0x02,                   //   Usage Page (Simulation Controls)
        0x09, 0xC8,                   //   Usage (Steering)
        0x15, 0x00,                   //   Logical Minimum (0)
        0x27, 0xFF, 0xFF, 0x00, 0x00, //   Logical Maximum (65535)
        0x75, 0x10,                   //   Report Size (16)
        0x95, 0x01,                   //   Report Count (1)
        0x81, 0x02,                   //   Input (Data, Variable, Absolute)
        0x05, 0x01,                   //   Usage Page (Generic Desktop)
        0x09, 0x32,                   //   Usage (Z)
        0x09, 0x35,                   //   Usage (Rz)
        0x26, 0xFF, 0x03,             //   Logical Maximum (1023)
        0x95, 0x02,                   //   Report Count (2)
        0x81, 0x02,                   //   Input (Data, Variable, Absolute)
        0x05, 0x09,                   //   Usage Page (Button)
        0x19, 0x01,                   //   Usage Minimum (1)
        0x29, 0x0C,                   //   Usage Maximum (12)
        0x25, 0x01,                   //   Logical Maximum (1)
        0x75, 0x01,                   //   Report Size (1)
        0x95, 0x0C,                   //   Report Count (12)
        0x81, 0x02,                   //   Input (Data, Variable, Absolute)
        0x95, 0x04,                   //   Report Count (4)
        0x81, 0x03,                   //   Input (Constant)
        0xC0,                         // End Collection
    ];

    #[rustfmt::skip]
    const GAMEPAD: &[u8] = &[
        0x05, 0x01, 0x09, 0x05, 0xA1, 0x01,
        0x09, 0x30, 0x09, 0x31,       // Usage (X), Usage (Y)
        0x15, 0x81, 0x25, 0x7F,       // Logical -127..=127
        0x75, 0x08, 0x95, 0x02, 0x81, 0x02,
        0x05, 0x09, 0x19, 0x01, 0x29, 0x08, 0x15, 0x00, 0x25, 0x01,
        0x75, 0x01, 0x95, 0x08, 0x81, 0x02,
        0xC0,
    ];

    fn fixed_payload(axes: [i16; 4], buttons: u32) -> Vec<u8> {
        let mut out = Vec::new();
        for a in axes {
            out.extend_from_slice(&a.to_le_bytes());
        }
        out.extend_from_slice(&buttons.to_le_bytes());
        out
    }

    #[test]
    fn fixed_layout_reads_unnumbered_reports() {
        let layout = ReportLayout::fixed_joystick();
        assert_eq!(layout.report_id(), None);
        assert_eq!(layout.report_len(), 12);

        let mut s = RawState::default();
        layout
            .decode(&fixed_payload([16383, -32768, 32767, -1], 0b101), &mut s)
            .expect("decode");
        assert_eq!((s.x, s.y, s.z, s.rz), (16383, -32768, 32767, -1));
        assert!(s.button(0));
        assert!(!s.button(1));
        assert!(s.button(2));
    }

    #[test]
    fn fixed_layout_ignores_trailing_bytes() {
        let mut report = fixed_payload([16383, 0, 0, 0], 1);
        report.extend_from_slice(&[0xAA; 4]);
        let mut s = RawState::default();
        ReportLayout::fixed_joystick()
            .decode(&report, &mut s)
            .expect("decode");
        assert_eq!(s.x, 16383);
        assert!(s.button(0));
    }

    #[test]
    fn wheel_descriptor_yields_numbered_layout() {
        let layout = ReportLayout::from_descriptor(WHEEL).expect("layout");
        assert_eq!(layout.report_id(), Some(1));
        assert_eq!(layout.axis_count(), 3);
        assert!(layout.axis(RawAxis::Y).is_none());
        assert_eq!(layout.button_count(), 12);
        assert_eq!(layout.report_len(), 9);

        let report = [0x01, 0xFF, 0xBF, 0xFF, 0x03, 0x00, 0x00, 0x01, 0x08];
        let mut s = RawState::default();
        layout.decode(&report, &mut s).expect("decode");
        assert_eq!(s.x, 16383);
        assert_eq!(s.y, 0);
        assert_eq!(s.z, 32767);
        assert_eq!(s.rz, -32768);
        assert!(s.button(0));
        assert!(s.button(11));
        assert_eq!(s.buttons.iter().filter(|b| **b).count(), 2);
    }

    #[test]
    fn numbered_layout_rejects_other_report_ids() {
        let layout = ReportLayout::from_descriptor(WHEEL).expect("layout");
        let mut s = RawState {
            x: 42,
            ..RawState::default()
        };
        let err = layout
            .decode(&[0x02, 0, 0, 0, 0, 0, 0, 0, 0], &mut s)
            .expect_err("wrong id");
        assert!(matches!(err, DeviceError::Report(_)));
        assert_eq!(s.x, 42);
    }

    #[test]
    fn gamepad_descriptor_reads_reports_without_id_byte() {
        let layout = ReportLayout::from_descriptor(GAMEPAD).expect("layout");
        assert_eq!(layout.report_id(), None);
        assert_eq!(layout.report_len(), 3);

        let mut s = RawState::default();
        layout.decode(&[0x7F, 0x81, 0x04], &mut s).expect("decode");
        assert_eq!(s.x, 32767);
        assert_eq!(s.y, -32768);
        assert!(s.button(2));
        assert!(!s.button(0));
    }

    #[test]
    fn short_report_is_rejected_and_state_kept() {
        let layout = ReportLayout::from_descriptor(GAMEPAD).expect("layout");
        let mut s = RawState {
            x: 42,
            ..RawState::default()
        };
        assert!(layout.decode(&[0x7F, 0x81], &mut s).is_err());
        assert_eq!(s.x, 42);
    }

    #[test]
    fn fields_that_straddle_bytes() {
        #[rustfmt::skip]
        let descriptor = [
            0x05, 0x01, 0x09, 0x04, 0xA1, 0x01,
            0x09, 0x30, 0x09, 0x31,
            0x15, 0x00, 0x26, 0xFF, 0x03,             // Logical 0..=1023
            0x75, 0x0A, 0x95, 0x02, 0x81, 0x02,       // 2 x 10 bits
            0x75, 0x04, 0x95, 0x01, 0x81, 0x03,       // 4 bits padding
            0x05, 0x09, 0x19, 0x01, 0x29, 0x08, 0x25, 0x01,
            0x75, 0x01, 0x95, 0x08, 0x81, 0x02,
            0xC0,
        ];
        let layout = ReportLayout::from_descriptor(&descriptor).expect("layout");
        assert_eq!(layout.report_len(), 4);

        let mut s = RawState::default();
        layout
            .decode(&[0xFF, 0x03, 0x08, 0x80], &mut s)
            .expect("decode");
        assert_eq!(s.x, 32767);
        assert_eq!(s.y, 31);
        assert!(s.button(7));
        assert_eq!(s.buttons.iter().filter(|b| **b).count(), 1);
    }

    #[test]
    fn busiest_input_report_wins() {
        #[rustfmt::skip]
        let descriptor = [
            0x05, 0x0C, 0x09, 0x01, 0xA1, 0x01,       // Consumer Control
            0x85, 0x01, 0x09, 0xE9, 0x15, 0x00, 0x25, 0x01,
            0x75, 0x08, 0x95, 0x01, 0x81, 0x02,
            0xC0,
            0x05, 0x01, 0x09, 0x04, 0xA1, 0x01,
            0x85, 0x02, 0x09, 0x30,
            0x16, 0x00, 0x80, 0x26, 0xFF, 0x7F,       // Logical -32768..=32767
            0x75, 0x10, 0x95, 0x01, 0x81, 0x02,
            0xC0,
        ];
        let layout = ReportLayout::from_descriptor(&descriptor).expect("layout");
        assert_eq!(layout.report_id(), Some(2));

        let mut s = RawState::default();
        layout.decode(&[0x02, 0xFF, 0x3F], &mut s).expect("decode");
        assert_eq!(s.x, 16383);
    }

    #[test]
    fn short_encoded_unsigned_maximum() {
        #[rustfmt::skip]
        let descriptor = [
            0x05, 0x01, 0x09, 0x30,
            0x15, 0x00, 0x25, 0xFF,                   // Logical Maximum (0xFF)
            0x75, 0x08, 0x95, 0x01, 0x81, 0x02,
        ];
        let layout = ReportLayout::from_descriptor(&descriptor).expect("layout");
        let mut s = RawState::default();
        layout.decode(&[0xFF], &mut s).expect("decode");
        assert_eq!(s.x, 32767);
        layout.decode(&[0x00], &mut s).expect("decode");
        assert_eq!(s.x, -32768);
    }

    #[test]
    fn descriptors_without_controls_or_truncated_are_errors() {
        let consumer_only = [
            0x05, 0x0C, 0x09, 0xE9, 0x75, 0x08, 0x95, 0x01, 0x81, 0x02,
        ];
        assert!(ReportLayout::from_descriptor(&consumer_only).is_err());
        assert!(ReportLayout::from_descriptor(&[0x05]).is_err());
        assert!(ReportLayout::from_descriptor(&[]).is_err());
    }

    #[test]
    fn restrict_drops_unrequested_controls() {
        let layout = ReportLayout::from_descriptor(GAMEPAD)
            .expect("layout")
            .restrict(&DataFormat::empty().with_axis(RawAxis::Y).with_buttons(2));
        assert_eq!(layout.button_count(), 2);

        let mut s = RawState::default();
        layout.decode(&[0x7F, 0x81, 0x07], &mut s).expect("decode");
        assert_eq!(s.x, 0);
        assert_eq!(s.y, -32768);
        assert!(s.button(0));
        assert!(s.button(1));
        assert!(!s.button(2));
    }
}
