//! WBS closure-form extraction.
//!
//! Lookup order:
//! 1. Cover sheet (`portada`) → code at `H27`; no cover sheet means the file
//!    is not a closure workbook.
//! 2. If that code fails validation: schedule sheet (`conexioncronograma`)
//!    → code at `A2`. A non-empty fallback is kept even when it fails
//!    validation again, with a warning on [`QUALITY_TARGET`].
//! 3. Closure sheet (`fichacierre`) → label/value rows for challenges,
//!    mitigation actions and lessons learned.
//!
//! Sheet names are compared after normalization; when two sheets collide the
//! later one is used. Missing sheets and cells are normal outcomes, never
//! errors.

use serde::Serialize;

use fichas_core::{
    ClosureFields, ClosureRecord, CodeValidator, FichasConfig, ProjectCode, TextNormalizer,
};

use crate::workbook::{Cell, CellRef, Sheet, Workbook};

/// Log target for low-confidence codes accepted from the fallback cell.
pub const QUALITY_TARGET: &str = "fichas::quality";

const COVER_SHEET: &str = "portada";
const SCHEDULE_SHEET: &str = "conexioncronograma";
const CLOSURE_SHEET: &str = "fichacierre";

const COVER_CODE_CELL: CellRef = CellRef::new(26, 7); // H27
const SCHEDULE_CODE_CELL: CellRef = CellRef::new(1, 0); // A2

const CHALLENGES_LABEL: &str = "retos";
const MITIGATION_LABEL: &str = "accionesdemitigacion";
const LESSONS_LABEL: &str = "leccionesaprendidas";

/// Where the extracted code came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeSource {
    /// Valid code on the cover sheet.
    Cover,
    /// Valid code on the schedule sheet.
    Schedule,
    /// Schedule-sheet code that failed validation but was kept.
    UnvalidatedSchedule,
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub code: ProjectCode,
    pub source: CodeSource,
    /// `None` when the closure sheet is absent or has none of the known labels.
    pub closure: Option<ClosureFields>,
}

impl Extraction {
    pub fn closure_record(&self) -> Option<ClosureRecord> {
        self.closure
            .as_ref()
            .map(|fields| ClosureRecord::new(self.code.clone(), fields.clone()))
    }
}

/// Locates the project code and closure notes in a workbook.
#[derive(Debug, Clone)]
pub struct FormExtractor {
    normalizer: TextNormalizer,
    validator: CodeValidator,
}

impl FormExtractor {
    pub fn new(normalizer: TextNormalizer, validator: CodeValidator) -> Self {
        Self {
            normalizer,
            validator,
        }
    }

    pub fn from_config(config: &FichasConfig) -> Self {
        Self::new(
            TextNormalizer::from_config(config),
            CodeValidator::from_config(config),
        )
    }

    /// Extract the code and, when present, the closure notes.
    ///
    /// Returns `None` when the workbook is not a recognisable closure form.
    pub fn extract(&self, workbook: &Workbook) -> Option<Extraction> {
        let (code, source) = self.locate_code(workbook)?;
        let closure = self
            .find_sheet(workbook, CLOSURE_SHEET)
            .and_then(|sheet| self.read_closure(sheet));
        Some(Extraction {
            code: ProjectCode::from(code),
            source,
            closure,
        })
    }

    fn locate_code(&self, workbook: &Workbook) -> Option<(String, CodeSource)> {
        let Some(cover) = self.find_sheet(workbook, COVER_SHEET) else {
            tracing::debug!("no cover sheet among {:?}", workbook.sheet_names());
            return None;
        };
        let candidate = cover.cell(COVER_CODE_CELL).as_text();
        if let Some(code) = candidate.as_deref().filter(|c| self.validator.is_valid(c)) {
            return Some((code.trim().to_string(), CodeSource::Cover));
        }

        let Some(schedule) = self.find_sheet(workbook, SCHEDULE_SHEET) else {
            tracing::warn!(
                target: QUALITY_TARGET,
                "cover code {:?} failed validation and no schedule sheet exists (sheets: {:?})",
                candidate,
                workbook.sheet_names()
            );
            return None;
        };
        let fallback = schedule
            .cell(SCHEDULE_CODE_CELL)
            .as_text()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let Some(code) = fallback else {
            tracing::warn!(
                target: QUALITY_TARGET,
                "cover code {:?} failed validation and schedule cell {} is empty",
                candidate,
                SCHEDULE_CODE_CELL
            );
            return None;
        };

        if self.validator.is_valid(&code) {
            Some((code, CodeSource::Schedule))
        } else {
            tracing::warn!(
                target: QUALITY_TARGET,
                "accepting unvalidated fallback code {code:?} (cover code {candidate:?})"
            );
            Some((code, CodeSource::UnvalidatedSchedule))
        }
    }

    fn read_closure(&self, sheet: &Sheet) -> Option<ClosureFields> {
        let mut fields = ClosureFields::default();
        for row in sheet.rows() {
            let mut values = row.iter().filter(|c| !c.is_blank()).filter_map(Cell::as_text);
            let Some(label) = values.next() else {
                continue;
            };
            let value: String = values.collect();
            if value.is_empty() {
                continue;
            }
            match self.normalizer.normalize(&label).as_str() {
                CHALLENGES_LABEL => fields.challenges = Some(value),
                MITIGATION_LABEL => fields.mitigation_actions = Some(value),
                LESSONS_LABEL => fields.lessons_learned = Some(value),
                _ => {}
            }
        }
        (!fields.is_empty()).then_some(fields)
    }

    /// When several sheets normalize to `canonical`, the last one wins.
    fn find_sheet<'a>(&self, workbook: &'a Workbook, canonical: &str) -> Option<&'a Sheet> {
        workbook
            .sheets()
            .iter()
            .rev()
            .find(|sheet| self.normalizer.matches(&sheet.name, canonical))
    }
}
