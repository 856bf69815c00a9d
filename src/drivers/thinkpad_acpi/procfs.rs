//! Text formats of the thinkpad_acpi procfs files.

use std::fmt;

/// Label expected at the start of the `thermal` file.
pub const THERMAL_LABEL: &str = "temperatures";
/// Prefix of the lines in the `fan` file that carry the current speed.
pub const SPEED_PREFIX: &str = "speed:";

/// Result of parsing the first line of the `thermal` file.
#[derive(Debug, PartialEq, Eq)]
pub enum Thermal {
    /// Highest value on the line.
    Max(i64),
    /// The line did not start with [`THERMAL_LABEL`]; holds what was found.
    BadLabel(String),
}

/// Parses `temperatures:\t50 47 0 -128 ...` into the highest reading.
///
/// Tokens are split on whitespace and `:`. Non-numeric tokens count as 0
/// and the maximum never drops below 0, so negative "sensor absent"
/// sentinels never win over a real reading.
pub fn parse_thermal(line: &str) -> Thermal {
    let mut tokens = line
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|token| !token.is_empty());

    match tokens.next() {
        Some(label) if label.eq_ignore_ascii_case(THERMAL_LABEL) => {
            Thermal::Max(tokens.map(parse_leading_int).fold(0, i64::max))
        }
        Some(label) => Thermal::BadLabel(label.to_string()),
        None => Thermal::BadLabel(String::new()),
    }
}

/// Extracts the fan speed from the full contents of the `fan` file.
///
/// The last `speed:` line wins; without one the fan is reported as 0 rpm.
pub fn parse_fan_speed<'a>(lines: impl IntoIterator<Item = &'a str>) -> i64 {
    lines
        .into_iter()
        .filter_map(|line| line.strip_prefix(SPEED_PREFIX))
        .map(parse_leading_int)
        .last()
        .unwrap_or(0)
}

/// Lenient integer parse: leading whitespace, optional sign, then digits.
/// Anything that is not a number yields 0; overflow saturates.
pub fn parse_leading_int(input: &str) -> i64 {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });

    if negative { -magnitude } else { magnitude }
}

/// Command accepted by the `fan` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanCommand {
    Enable,
    Disable,
}

impl FanCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            FanCommand::Enable => "enable",
            FanCommand::Disable => "disable",
        }
    }

    /// Exact bytes written to the control file.
    pub fn to_line(self) -> String {
        format!("{}\n", self.as_str())
    }
}

impl From<bool> for FanCommand {
    fn from(enable: bool) -> Self {
        if enable {
            FanCommand::Enable
        } else {
            FanCommand::Disable
        }
    }
}

impl fmt::Display for FanCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
