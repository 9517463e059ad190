use formula_diagnostic::Severity;
use formula_ir::{Name, Span};
use pretty_assertions::assert_eq;

use super::*;

fn loc(start: u32) -> Location {
    Location::new(Name::from_raw(1), Span::new(start, start + 1))
}

#[test]
fn ambiguity_labels_both_candidates() {
    let err = CheckError::new(
        loc(0),
        CheckErrorKind::AmbiguousSymbol {
            name: "V".into(),
            first: loc(10),
            second: loc(20),
        },
    );
    let diag = err.to_diagnostic();
    assert_eq!(diag.code, ErrorCode::E1002);
    assert_eq!(diag.message, "`V` is ambiguous");
    assert_eq!(diag.labels.len(), 3);
    assert_eq!(diag.labels[1].location, loc(10));
    assert_eq!(diag.labels[2].location, loc(20));
}

#[test]
fn contract_warning_is_a_warning() {
    let err = CheckError::new(
        loc(0),
        CheckErrorKind::CardContractWarning {
            sort: "V".into(),
            reason: "can never hold".into(),
        },
    );
    assert!(err.is_warning());
    assert_eq!(err.to_diagnostic().severity, Severity::Warning);
}

#[test]
fn every_kind_has_a_distinct_code() {
    let kinds = [
        CheckErrorKind::UndefinedSymbol { name: String::new() },
        CheckErrorKind::BadComposition { reason: String::new() },
        CheckErrorKind::BadId {
            id: String::new(),
            usage: "a renaming",
        },
        CheckErrorKind::TotalityError {
            map: String::new(),
            reason: String::new(),
        },
        CheckErrorKind::RelationalError {
            sort: String::new(),
            position: String::new(),
        },
        CheckErrorKind::CardNewnessError { sort: String::new() },
        CheckErrorKind::LabelClashError { label: String::new() },
        CheckErrorKind::BadTypeDecl {
            name: String::new(),
            reason: String::new(),
        },
    ];
    let codes: std::collections::HashSet<_> = kinds.iter().map(CheckErrorKind::code).collect();
    assert_eq!(codes.len(), kinds.len());
}

#[test]
fn abort_wraps_internal_errors() {
    let abort: CheckAbort = InternalError::RelabelFailed {
        path: "Graph.V".to_owned(),
    }
    .into();
    assert_eq!(abort.to_string(), "relabeling `Graph.V` failed after it type-checked");
}
