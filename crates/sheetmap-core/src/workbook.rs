//! Workbook: an ordered list of sheets plus file-level settings

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// Settings carried between reading and writing a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookSettings {
    /// Serial dates count from 1904-01-01 instead of 1899-12-30
    pub date_1904: bool,
}

/// A spreadsheet document
///
/// Records are only ever mapped against the first sheet. Any other sheets
/// survive an append untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    settings: WorkbookSettings,
}

impl Workbook {
    /// One empty sheet named `Sheet1`
    pub fn new() -> Self {
        Self {
            sheets: vec![Worksheet::new("Sheet1")],
            settings: WorkbookSettings::default(),
        }
    }

    /// No sheets at all; what a reader returns for a document without any
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    /// The sheet records are read from and written to
    pub fn first_sheet(&self) -> Option<&Worksheet> {
        self.sheets.first()
    }

    pub fn first_sheet_mut(&mut self) -> Option<&mut Worksheet> {
        self.sheets.first_mut()
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter()
    }

    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    /// Append an empty sheet, returning its index
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.add_existing_worksheet(Worksheet::new(name))
    }

    /// Append a sheet built elsewhere (by a reader), returning its index
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        check_sheet_name(worksheet.name())?;
        let taken = self
            .sheets
            .iter()
            .any(|s| s.name().eq_ignore_ascii_case(worksheet.name()));
        if taken {
            return Err(Error::DuplicateSheetName(worksheet.name().to_string()));
        }
        self.sheets.push(worksheet);
        Ok(self.sheets.len() - 1)
    }
}

/// Names Excel accepts: non-blank, at most 31 characters, none of `[]:*?/\`
fn check_sheet_name(name: &str) -> Result<()> {
    let problem = if name.trim().is_empty() {
        Some("a sheet name can not be blank".to_string())
    } else if name.chars().count() > MAX_SHEET_NAME_LEN {
        Some(format!(
            "sheet name '{}' is longer than {} characters",
            name, MAX_SHEET_NAME_LEN
        ))
    } else {
        name.chars()
            .find(|c| "[]:*?/\\".contains(*c))
            .map(|c| format!("sheet name '{}' contains '{}'", name, c))
    };
    match problem {
        Some(msg) => Err(Error::InvalidSheetName(msg)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_and_empty() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.first_sheet().map(|s| s.name()), Some("Sheet1"));
        assert!(!wb.settings().date_1904);
        assert!(Workbook::empty().first_sheet().is_none());
        assert!(Workbook::empty().is_empty());
    }

    #[test]
    fn test_sheet_names() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_worksheet_with_name("Data").unwrap(), 1);
        assert!(matches!(
            wb.add_worksheet_with_name("DATA"),
            Err(Error::DuplicateSheetName(_))
        ));
        for bad in ["  ", "a/b", "x[1]", "a name that is far too long for a sheet"] {
            assert!(
                matches!(wb.add_worksheet_with_name(bad), Err(Error::InvalidSheetName(_))),
                "{bad}"
            );
        }
        assert_eq!(wb.sheet_count(), 2);
        assert_eq!(wb.worksheet(1).map(|s| s.name()), Some("Data"));
    }
}
