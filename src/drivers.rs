//! Hardware drivers.

pub mod thinkpad_acpi;
