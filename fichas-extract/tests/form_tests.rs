//! Closure-form extraction tests for `fichas-extract`.
//!
//! Workbooks are built in memory; each case is independent.

use fichas_core::{
    config::default_character_replacements, ClosureFields, CodeValidator, ProjectCode,
    TextNormalizer,
};
use fichas_extract::{Cell, CellRef, CodeSource, FormExtractor, Sheet, Workbook};
use rstest::rstest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn extractor() -> FormExtractor {
    let _ = env_logger::builder().is_test(true).try_init();
    FormExtractor::new(
        TextNormalizer::new(&default_character_replacements()),
        CodeValidator::new(["EDU", "GEO"], 4),
    )
}

fn at(a1: &str) -> CellRef {
    a1.parse().expect("cell ref")
}

fn cover(name: &str, code: impl Into<Cell>) -> Sheet {
    Sheet::new(name).with_cell(at("H27"), code)
}

fn schedule(code: impl Into<Cell>) -> Sheet {
    Sheet::new("Conexion Cronograma").with_cell(at("A2"), code)
}

fn text_row(cells: &[&str]) -> Vec<Cell> {
    cells.iter().map(|c| Cell::from(*c)).collect()
}

fn closure_sheet(name: &str, rows: &[&[&str]]) -> Sheet {
    Sheet::from_rows(name, rows.iter().map(|r| text_row(r)).collect())
}

// ---------------------------------------------------------------------------
// Code location
// ---------------------------------------------------------------------------

#[test]
fn cover_code_and_single_closure_field() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "EDU1234"))
        .with_sheet(closure_sheet("FichaCierre", &[&["Retos", "Risk of delay"]]));

    let got = extractor().extract(&wb).expect("extraction");
    assert_eq!(got.code, ProjectCode::from("EDU1234"));
    assert_eq!(got.source, CodeSource::Cover);
    assert_eq!(
        got.closure,
        Some(ClosureFields {
            challenges: Some("Risk of delay".to_string()),
            mitigation_actions: None,
            lessons_learned: None,
        })
    );
}

#[test]
fn workbook_without_cover_sheet_is_not_a_form() {
    let wb = Workbook::default()
        .with_sheet(Sheet::new("Resumen").with_cell(at("H27"), "EDU1234"))
        .with_sheet(closure_sheet("FichaCierre", &[&["Retos", "x"]]));
    assert!(extractor().extract(&wb).is_none());
}

#[test]
fn empty_workbook_is_not_a_form() {
    assert!(extractor().extract(&Workbook::default()).is_none());
}

#[rstest]
#[case("PORTADA")]
#[case("  Portada ")]
#[case("Pórtada")]
#[case("portada.")]
fn cover_sheet_name_drift_is_tolerated(#[case] name: &str) {
    let wb = Workbook::default().with_sheet(cover(name, "GEO98765"));
    let got = extractor().extract(&wb).expect("extraction");
    assert_eq!(got.code.as_str(), "GEO98765");
}

#[test]
fn invalid_cover_code_falls_back_to_schedule_sheet() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "TBD"))
        .with_sheet(schedule("GEO55555"));
    let got = extractor().extract(&wb).expect("extraction");
    assert_eq!(got.code.as_str(), "GEO55555");
    assert_eq!(got.source, CodeSource::Schedule);
}

#[test]
fn empty_cover_cell_falls_back_to_schedule_sheet() {
    let wb = Workbook::default()
        .with_sheet(Sheet::new("Portada"))
        .with_sheet(schedule("EDU10001"));
    let got = extractor().extract(&wb).expect("extraction");
    assert_eq!(got.code.as_str(), "EDU10001");
}

#[test]
fn invalid_cover_code_without_schedule_sheet_fails() {
    let wb = Workbook::default().with_sheet(cover("Portada", "XX1"));
    assert!(extractor().extract(&wb).is_none());
}

#[rstest]
#[case(Cell::Empty)]
#[case(Cell::Text("   ".to_string()))]
fn blank_fallback_code_fails(#[case] fallback: Cell) {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "XX1"))
        .with_sheet(schedule(fallback));
    assert!(extractor().extract(&wb).is_none());
}

#[test]
fn invalid_fallback_code_is_kept_with_low_confidence() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "XX1"))
        .with_sheet(schedule(" P-17 "));
    let got = extractor().extract(&wb).expect("extraction");
    assert_eq!(got.code.as_str(), "P-17");
    assert_eq!(got.source, CodeSource::UnvalidatedSchedule);
}

// ---------------------------------------------------------------------------
// Closure notes
// ---------------------------------------------------------------------------

#[test]
fn all_three_labels_with_noise_rows() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "EDU1234"))
        .with_sheet(closure_sheet(
            "Ficha de Cierre ",
            &[&["FICHA DE CIERRE DEL PROYECTO"]],
        ))
        .with_sheet(closure_sheet(
            "Ficha Cierre",
            &[
                &["", "", ""],
                &["Ficha de cierre"],
                &["", "Retos:", "", "Clima", " y acceso"],
                &["Acciones de Mitigación", "Rutas alternas"],
                &["Observaciones", "ignored"],
                &["Lecciones Aprendidas", "Planear antes"],
            ],
        ));

    let closure = extractor()
        .extract(&wb)
        .and_then(|e| e.closure)
        .expect("closure fields");
    assert_eq!(closure.challenges.as_deref(), Some("Clima y acceso"));
    assert_eq!(closure.mitigation_actions.as_deref(), Some("Rutas alternas"));
    assert_eq!(closure.lessons_learned.as_deref(), Some("Planear antes"));
}

#[test]
fn closure_sheet_without_known_labels_yields_code_only() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "EDU1234"))
        .with_sheet(closure_sheet(
            "FichaCierre",
            &[&["Observaciones", "n/a"], &["Responsable", "Ana"]],
        ));
    let got = extractor().extract(&wb).expect("extraction");
    assert_eq!(got.code.as_str(), "EDU1234");
    assert!(got.closure.is_none(), "no empty closure record may be fabricated");
    assert!(got.closure_record().is_none());
}

#[test]
fn label_without_value_is_ignored() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "EDU1234"))
        .with_sheet(closure_sheet(
            "FichaCierre",
            &[&["Retos", "   "], &["Lecciones aprendidas", "Documentar"]],
        ));
    let closure = extractor()
        .extract(&wb)
        .and_then(|e| e.closure)
        .expect("closure fields");
    assert!(closure.challenges.is_none());
    assert_eq!(closure.lessons_learned.as_deref(), Some("Documentar"));
}

#[test]
fn numeric_values_are_concatenated_as_text() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "EDU1234"))
        .with_sheet(Sheet::from_rows(
            "FichaCierre",
            vec![vec![
                Cell::from("Retos"),
                Cell::Number(3.0),
                Cell::from(" riesgos"),
            ]],
        ));
    let closure = extractor()
        .extract(&wb)
        .and_then(|e| e.closure)
        .expect("closure fields");
    assert_eq!(closure.challenges.as_deref(), Some("3 riesgos"));
}

#[test]
fn later_closure_sheet_wins_over_template_tab() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "EDU1234"))
        .with_sheet(closure_sheet("FichaCierre", &[&["Notas", "plantilla"]]))
        .with_sheet(closure_sheet("Ficha Cierre", &[&["Retos", "Risk of delay"]]));
    let closure = extractor()
        .extract(&wb)
        .and_then(|e| e.closure)
        .expect("closure fields");
    assert_eq!(closure.challenges.as_deref(), Some("Risk of delay"));
}

#[test]
fn later_cover_sheet_supplies_the_code() {
    let wb = Workbook::default()
        .with_sheet(cover("PORTADA", "EDU0000"))
        .with_sheet(cover("Portada", "GEO5678"));
    let got = extractor().extract(&wb).expect("extraction");
    assert_eq!(got.code, ProjectCode::from("GEO5678"));
    assert_eq!(got.source, CodeSource::Cover);
}

#[test]
fn extraction_serializes_for_reporting() {
    let wb = Workbook::default()
        .with_sheet(cover("Portada", "EDU1234"))
        .with_sheet(closure_sheet("FichaCierre", &[&["Retos", "Risk of delay"]]));
    let got = extractor().extract(&wb).expect("extraction");
    let json = serde_json::to_value(&got).expect("json");
    assert_eq!(json["code"], "EDU1234");
    assert_eq!(json["source"], "cover");
    assert_eq!(json["closure"]["challenges"], "Risk of delay");
    assert!(json["closure"].get("lessons_learned").is_none());
}
