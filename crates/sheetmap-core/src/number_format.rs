//! Number format types
//!
//! Spreadsheet files store dates as plain numbers; only the number format
//! attached to the cell tells a reader that a value is a date.

use lazy_regex::regex_replace_all;

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// First id available for custom formats in a styles part
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// Format used for date cells written by the mapper
    pub const DATE_TIME_CODE: &'static str = "yyyy-mm-dd hh:mm:ss";

    /// Resolve a `numFmtId` against the custom formats declared in a file
    pub fn from_id_with_custom(id: u32, custom: Option<&str>) -> Self {
        match custom {
            Some(code) => NumberFormat::Custom(code.to_string()),
            None if id == 0 => NumberFormat::General,
            None => NumberFormat::BuiltIn(id),
        }
    }

    /// Get the format string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_format_string(*id),
            NumberFormat::Custom(s) => s,
        }
    }

    fn builtin_format_string(id: u32) -> &'static str {
        match id {
            1 => "0",
            2 => "0.00",
            3 => "#,##0",
            4 => "#,##0.00",
            9 => "0%",
            10 => "0.00%",
            11 => "0.00E+00",
            14 => "mm-dd-yy",
            15 => "d-mmm-yy",
            16 => "d-mmm",
            17 => "mmm-yy",
            18 => "h:mm AM/PM",
            19 => "h:mm:ss AM/PM",
            20 => "h:mm",
            21 => "h:mm:ss",
            22 => "m/d/yy h:mm",
            45 => "mm:ss",
            46 => "[h]:mm:ss",
            47 => "mmss.0",
            49 => "@",
            _ => "General",
        }
    }

    /// Check if this is a date/time format
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(s) => {
                // Drop quoted literals, [Red]/[$-409] sections and escaped characters
                let stripped = regex_replace_all!(r#""[^"]*"|\[[^\]]*\]|\\.|_.|\*."#, s, "");
                let lower = stripped.to_lowercase();
                lower != "general" && lower.contains(&['y', 'm', 'd', 'h', 's'][..])
            }
            NumberFormat::General => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_date_ids() {
        assert!(NumberFormat::BuiltIn(14).is_date_format());
        assert!(NumberFormat::BuiltIn(22).is_date_format());
        assert!(NumberFormat::BuiltIn(46).is_date_format());
        assert!(!NumberFormat::BuiltIn(2).is_date_format());
        assert!(!NumberFormat::General.is_date_format());
    }

    #[test]
    fn test_custom_date_formats() {
        assert!(NumberFormat::Custom("yyyy-mm-dd".into()).is_date_format());
        assert!(NumberFormat::Custom("[$-409]d-mmm-yyyy".into()).is_date_format());
        assert!(NumberFormat::Custom(NumberFormat::DATE_TIME_CODE.into()).is_date_format());
    }

    #[test]
    fn test_custom_number_formats_are_not_dates() {
        assert!(!NumberFormat::Custom("#,##0.00;[Red]-#,##0.00".into()).is_date_format());
        assert!(!NumberFormat::Custom("0.00\" days\"".into()).is_date_format());
        assert!(!NumberFormat::Custom("0.0E+00".into()).is_date_format());
    }

    #[test]
    fn test_from_id_with_custom() {
        assert_eq!(NumberFormat::from_id_with_custom(0, None), NumberFormat::General);
        assert_eq!(
            NumberFormat::from_id_with_custom(14, None).format_string(),
            "mm-dd-yy"
        );
        assert_eq!(
            NumberFormat::from_id_with_custom(164, Some("yyyy")),
            NumberFormat::Custom("yyyy".into())
        );
    }
}
