// src/catalogue/mod.rs
pub mod cells;

use std::{collections::BTreeMap, fmt, io::Cursor};

use calamine::{Reader, Xlsx};
use tracing::{debug, info, instrument};

use crate::error::CatalogueLoadError;

/// Label the rule authors put in the first cell of a sheet's header row.
pub const RULE_ID_HEADER: &str = "Rule ID";

/// The closed set of rule groups the annotation step consumes, in the order
/// their triggers are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleCategory {
    DataIntegrityVulnerability,
    PriceValueAssessment,
    ClarityUnderstanding,
    OutlierConsistencyCheck,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::DataIntegrityVulnerability,
        RuleCategory::PriceValueAssessment,
        RuleCategory::ClarityUnderstanding,
        RuleCategory::OutlierConsistencyCheck,
    ];

    /// Sheet name of this group in the workbook.
    pub fn label(&self) -> &'static str {
        match self {
            RuleCategory::DataIntegrityVulnerability => "Data Integrity & Vulnerability",
            RuleCategory::PriceValueAssessment => "Price & Value Assessment",
            RuleCategory::ClarityUnderstanding => "Clarity & Understanding",
            RuleCategory::OutlierConsistencyCheck => "Outlier & Consistency Check",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of a rule sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRecord {
    pub id: String,
    pub condition: String,
    pub description: String,
}

impl RuleRecord {
    pub fn new(
        id: impl Into<String>,
        condition: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            condition: condition.into(),
            description: description.into(),
        }
    }

    /// Take the first three cells; cells the row doesn't have are empty.
    fn from_cells(cells: &[String]) -> Self {
        let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
        Self::new(cell(0), cell(1), cell(2))
    }

    /// Id, condition and description are all non-blank.
    pub fn is_complete(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.condition.trim().is_empty()
            && !self.description.trim().is_empty()
    }
}

/// One sheet of the workbook. `records` keeps the sheet's row order,
/// including a leading header row if the sheet has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    pub name: String,
    pub records: Vec<RuleRecord>,
}

impl RuleGroup {
    pub fn new(name: impl Into<String>, records: Vec<RuleRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Build a group from tabulated sheet rows, dropping rows with no content.
    pub fn from_rows(name: impl Into<String>, rows: &[Vec<String>]) -> Self {
        let name = name.into();
        let records: Vec<RuleRecord> = rows
            .iter()
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
            .map(|row| RuleRecord::from_cells(row))
            .collect();
        debug!(group = %name, rows = rows.len(), records = records.len(), "built rule group");
        Self { name, records }
    }

    pub fn has_header(&self) -> bool {
        self.records
            .first()
            .is_some_and(|r| r.id.trim().eq_ignore_ascii_case(RULE_ID_HEADER))
    }

    /// Records to evaluate, with their zero-based position in the sheet.
    /// A header row is never yielded.
    pub fn rules(&self) -> impl Iterator<Item = (usize, &RuleRecord)> {
        let skip = usize::from(self.has_header());
        self.records.iter().enumerate().skip(skip)
    }
}

/// All rule groups of one workbook, keyed by sheet name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleCatalogue {
    groups: BTreeMap<String, RuleGroup>,
}

impl RuleCatalogue {
    /// Parse an `.xlsx` workbook held in memory. Every sheet becomes a group,
    /// recognised or not.
    #[instrument(level = "info", skip(bytes), fields(bytes = bytes.len()))]
    pub fn load(bytes: &[u8]) -> Result<Self, CatalogueLoadError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
        let sheet_names = workbook.sheet_names();

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet in sheet_names {
            let values = match workbook.worksheet_range(&sheet) {
                Ok(range) => range,
                Err(source) => return Err(CatalogueLoadError::Sheet { sheet, source }),
            };
            let formulas = match workbook.worksheet_formula(&sheet) {
                Ok(range) => range,
                Err(source) => return Err(CatalogueLoadError::Sheet { sheet, source }),
            };
            let rows = cells::merge_sheet(&values, Some(&formulas));
            sheets.push((sheet, rows));
        }

        let catalogue = Self::from_sheets(sheets);
        info!(groups = catalogue.len(), "loaded rule catalogue");
        Ok(catalogue)
    }

    /// Build a catalogue from sheets that are already tabulated as text.
    pub fn from_sheets<I, S>(sheets: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Vec<String>>)>,
        S: Into<String>,
    {
        let groups = sheets
            .into_iter()
            .map(|(name, rows)| {
                let group = RuleGroup::from_rows(name, &rows);
                (group.name.clone(), group)
            })
            .collect();
        Self { groups }
    }

    pub fn from_groups(groups: impl IntoIterator<Item = RuleGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.name.clone(), g)).collect(),
        }
    }

    pub fn group(&self, name: &str) -> Option<&RuleGroup> {
        self.groups.get(name)
    }

    pub fn category(&self, category: RuleCategory) -> Option<&RuleGroup> {
        self.group(category.label())
    }

    pub fn groups(&self) -> impl Iterator<Item = &RuleGroup> {
        self.groups.values()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{workbook_bytes, XCell};
    use anyhow::Result;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn loads_every_sheet_as_a_group() -> Result<()> {
        let bytes = workbook_bytes(&[
            (
                "Data Integrity & Vulnerability",
                vec![
                    vec![
                        XCell::Text("Rule ID"),
                        XCell::Text("Condition"),
                        XCell::Text("Description"),
                    ],
                    vec![
                        XCell::Text("R1"),
                        XCell::Text("John"),
                        XCell::Text("Name flagged"),
                    ],
                ],
            ),
            (
                "Scratch",
                vec![vec![XCell::Text("notes only")]],
            ),
        ])?;

        let catalogue = RuleCatalogue::load(&bytes)?;
        assert_eq!(catalogue.len(), 2);

        let group = catalogue
            .category(RuleCategory::DataIntegrityVulnerability)
            .expect("integrity group");
        assert!(group.has_header());
        assert_eq!(group.records.len(), 2);
        assert_eq!(group.records[1], RuleRecord::new("R1", "John", "Name flagged"));

        let scratch = catalogue.group("Scratch").expect("unrecognised sheet kept");
        assert_eq!(scratch.records, vec![RuleRecord::new("notes only", "", "")]);
        Ok(())
    }

    #[test]
    fn formula_cells_keep_their_source_text() -> Result<()> {
        let bytes = workbook_bytes(&[(
            "Price & Value Assessment",
            vec![vec![
                XCell::Text("P1"),
                XCell::Formula("SUM(D1:D3)", "6"),
                XCell::Text("Charges above cap"),
            ]],
        )])?;

        let catalogue = RuleCatalogue::load(&bytes)?;
        let group = catalogue
            .category(RuleCategory::PriceValueAssessment)
            .expect("price group");
        assert_eq!(group.records[0].condition, "SUM(D1:D3)");
        Ok(())
    }

    #[test]
    fn filled_down_formulas_keep_their_own_source_text() -> Result<()> {
        let bytes = workbook_bytes(&[(
            "Price & Value Assessment",
            vec![
                vec![
                    XCell::Text("P1"),
                    XCell::SharedFormula("D1*2", "B1:B2", "2"),
                    XCell::Text("Double charge"),
                    XCell::Number(1.0),
                ],
                vec![
                    XCell::Text("P2"),
                    XCell::SharedFill("4"),
                    XCell::Text("Double charge"),
                    XCell::Number(2.0),
                ],
            ],
        )])?;

        let catalogue = RuleCatalogue::load(&bytes)?;
        let group = catalogue
            .category(RuleCategory::PriceValueAssessment)
            .expect("price group");
        let conditions: Vec<&str> = group.records.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(conditions, vec!["D1*2", "D2*2"]);
        Ok(())
    }

    #[test]
    fn date_formatted_cells_render_as_dates() -> Result<()> {
        let bytes = workbook_bytes(&[(
            "Outlier & Consistency Check",
            vec![vec![
                XCell::Text("O1"),
                XCell::Date(45306.0),
                XCell::Text("Dated rule"),
            ]],
        )])?;

        let catalogue = RuleCatalogue::load(&bytes)?;
        let group = catalogue
            .category(RuleCategory::OutlierConsistencyCheck)
            .expect("outlier group");
        assert_eq!(
            group.records[0],
            RuleRecord::new("O1", "Mon Jan 15 00:00:00 UTC 2024", "Dated rule")
        );
        Ok(())
    }

    #[test]
    fn numeric_and_boolean_cells_are_coerced() -> Result<()> {
        let bytes = workbook_bytes(&[(
            "Outlier & Consistency Check",
            vec![vec![
                XCell::Number(42.0),
                XCell::Bool(true),
                XCell::Number(0.5),
            ]],
        )])?;

        let catalogue = RuleCatalogue::load(&bytes)?;
        let group = catalogue
            .category(RuleCategory::OutlierConsistencyCheck)
            .expect("outlier group");
        assert_eq!(group.records[0], RuleRecord::new("42.0", "true", "0.5"));
        Ok(())
    }

    #[test]
    fn rejects_bytes_that_are_not_a_workbook() {
        let err = RuleCatalogue::load(b"Rule ID,Condition\nR1,John\n").unwrap_err();
        assert!(matches!(err, CatalogueLoadError::Workbook(_)));
    }

    #[test]
    fn header_detection_is_case_insensitive() {
        let group = RuleGroup::from_rows(
            "g",
            &[row(&["rule id", "Condition", "Description"]), row(&["R1", "a", "b"])],
        );
        assert!(group.has_header());
        let ids: Vec<&str> = group.rules().map(|(_, r)| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R1"]);
    }

    #[test]
    fn blank_rows_are_dropped_and_short_rows_padded() {
        let group = RuleGroup::from_rows(
            "g",
            &[row(&["", "", ""]), row(&["R1", "x"]), row(&["  "])],
        );
        assert_eq!(group.records, vec![RuleRecord::new("R1", "x", "")]);
        assert!(!group.records[0].is_complete());
        assert!(!group.has_header());
    }

    #[test]
    fn category_labels_round_trip() {
        for c in RuleCategory::ALL {
            assert_eq!(RuleCategory::from_label(c.label()), Some(c));
        }
        assert_eq!(RuleCategory::from_label("Scratch"), None);
    }
}
