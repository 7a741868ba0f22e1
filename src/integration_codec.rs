// Conversion between integration time in seconds and line codes.

use serde::Serialize;

/// How a line code is stored in the exposure register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum LineEncoding {
    /// The register holds the line code itself.
    Direct,
    /// The register holds the shutter start line counted from the frame end
    /// (`frame_length_lines - lines`), as on Sony SHR registers.
    FromFrameEnd,
}

impl LineEncoding {
    pub fn to_register(&self, frame_length_lines: u32, line_code: u32) -> u32 {
        match self {
            LineEncoding::Direct => line_code,
            LineEncoding::FromFrameEnd => frame_length_lines.saturating_sub(line_code),
        }
    }

    pub fn from_register(&self, frame_length_lines: u32, value: u32) -> u32 {
        match self {
            LineEncoding::Direct => value,
            LineEncoding::FromFrameEnd => frame_length_lines.saturating_sub(value),
        }
    }
}

/// A quantized integration time. `line_code` is in sub-line units.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct IntegrationCode {
    pub line_code: u32,
    pub time: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegrationCodec {
    one_line_time: f32,
    min_lines: u32,
    max_lines: u32,
    // Codes per line: 1 for whole lines, 32 for a x.5 fixed-point format.
    sub_line: u32,
}

impl IntegrationCodec {
    pub fn new(one_line_time: f32, min_lines: u32, max_lines: u32, sub_line: u32)
               -> Self {
        IntegrationCodec{one_line_time, min_lines, max_lines, sub_line: sub_line.max(1)}
    }

    pub fn min_code(&self) -> u32 {
        self.min_lines * self.sub_line
    }

    pub fn max_code(&self) -> u32 {
        self.max_lines * self.sub_line
    }

    pub fn min_time(&self) -> f32 {
        self.decode(self.min_code())
    }

    pub fn max_time(&self) -> f32 {
        self.decode(self.max_code())
    }

    pub fn step(&self) -> f32 {
        self.one_line_time / self.sub_line as f32
    }

    /// Rounds `time` to the nearest code and saturates it into the line
    /// bounds.
    pub fn encode(&self, time: f32) -> IntegrationCode {
        let raw = (time / self.one_line_time * self.sub_line as f32).round();
        // Float to int casts saturate, NaN becomes 0.
        let line_code = (raw as u32).max(self.min_code()).min(self.max_code());
        IntegrationCode{line_code, time: self.decode(line_code)}
    }

    pub fn decode(&self, line_code: u32) -> f32 {
        line_code as f32 * self.one_line_time / self.sub_line as f32
    }

    /// Frames the caller should drop before the new exposure is visible.
    pub fn frames_to_skip(previous: Option<u32>, line_code: u32, latency: u8) -> u8 {
        if previous == Some(line_code) { 0 } else { latency }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_example() {
        let codec = IntegrationCodec::new(0.000_036, 8, 0x486 - 8, 1);
        let code = codec.encode(0.01);
        assert_eq!(code.line_code, 278);
        assert!((code.time - 278.0 * 0.000_036).abs() < 1e-7);
    }

    #[test]
    fn clamps_to_line_bounds() {
        let codec = IntegrationCodec::new(0.000_036, 8, 1150, 1);
        assert_eq!(codec.encode(0.0).line_code, 8);
        assert_eq!(codec.encode(-1.0).line_code, 8);
        assert_eq!(codec.encode(f32::NAN).line_code, 8);
        assert_eq!(codec.encode(10.0).line_code, 1150);
    }

    #[test]
    fn fractional_lines() {
        let codec = IntegrationCodec::new(0.000_03, 1, 32, 32);
        // 2.25 lines in 1/32 line units.
        let code = codec.encode(0.000_067_5);
        assert_eq!(code.line_code, 72);
        assert_eq!(codec.min_code(), 32);
        assert_eq!(codec.max_code(), 1024);
        assert!((codec.step() - 0.000_03 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn skip_only_on_change() {
        assert_eq!(IntegrationCodec::frames_to_skip(None, 278, 1), 1);
        assert_eq!(IntegrationCodec::frames_to_skip(Some(100), 278, 2), 2);
        assert_eq!(IntegrationCodec::frames_to_skip(Some(278), 278, 1), 0);
    }

    #[test]
    fn frame_end_encoding() {
        let enc = LineEncoding::FromFrameEnd;
        assert_eq!(enc.to_register(2250, 1000), 1250);
        assert_eq!(enc.from_register(2250, 1250), 1000);
        assert_eq!(LineEncoding::Direct.to_register(2250, 1000), 1000);
    }
}
