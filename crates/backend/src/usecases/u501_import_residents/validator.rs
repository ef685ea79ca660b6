use once_cell::sync::Lazy;
use regex::Regex;

use contracts::usecases::u501_import_residents::{
    CandidateField, ImportSchema, ResidentCandidate, RowError,
};

use super::directory::{ExistingResidentIndex, UnitDirectory};
use super::parser::RawRow;
use crate::shared::cpf;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Tokens that count as "yes" for the owner/responsible columns.
/// Anything else, blank included, is "no" and never a validation error.
const TRUTHY_TOKENS: [&str; 7] = ["sim", "s", "yes", "y", "true", "1", "x"];

pub fn parse_flag(token: &str) -> bool {
    let token = token.trim().to_lowercase();
    TRUTHY_TOKENS.contains(&token.as_str())
}

fn email_is_well_formed(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Run the full pipeline on one raw row: field rules, unit resolution,
/// duplicate detection. Pure function of its inputs; identical inputs
/// always produce an identical candidate.
pub fn validate_row(
    raw: &RawRow,
    schema: ImportSchema,
    directory: &UnitDirectory,
    existing: &ExistingResidentIndex,
) -> ResidentCandidate {
    let block_label = raw.block_label.trim().to_string();
    let apartment_label = raw.apartment_label.trim().to_string();
    let full_name = raw.full_name.trim().to_string();
    let email = raw.email.trim().to_string();
    let phone = raw.phone.trim().to_string();
    let tax_id = raw.tax_id.trim().to_string();

    let mut errors = Vec::new();
    let mut resolved_apartment_id = None;

    if block_label.is_empty() {
        errors.push(RowError::BlockRequired);
    }
    if apartment_label.is_empty() {
        errors.push(RowError::ApartmentRequired);
    }
    if !block_label.is_empty() && !apartment_label.is_empty() {
        match directory.resolve(&block_label, &apartment_label) {
            Some(id) => resolved_apartment_id = Some(id),
            None => errors.push(RowError::UnitNotFound),
        }
    }

    if full_name.chars().count() < 2 {
        errors.push(RowError::InvalidName);
    }

    if schema.has_email() && !email_is_well_formed(&email) {
        errors.push(RowError::InvalidEmail);
    }

    if schema.has_tax_id() && !tax_id.is_empty() && !cpf::is_valid_cpf(&tax_id) {
        errors.push(RowError::InvalidTaxId);
    }

    let mut candidate = ResidentCandidate {
        line: raw.line,
        block_label,
        apartment_label,
        full_name,
        email,
        phone,
        tax_id,
        is_owner: parse_flag(&raw.owner_token),
        is_responsible: parse_flag(&raw.responsible_token),
        resolved_apartment_id,
        errors,
    };

    mark_duplicate(&mut candidate, existing);
    candidate
}

/// Flag the candidate when its (unit, email) pair is already on file.
/// Needs a resolved unit and a non-blank email, so the reduced schema
/// never trips this check.
pub fn mark_duplicate(candidate: &mut ResidentCandidate, existing: &ExistingResidentIndex) {
    if let Some(apartment_id) = &candidate.resolved_apartment_id {
        if !candidate.email.trim().is_empty()
            && existing.contains(apartment_id, &candidate.email)
        {
            candidate.errors.push(RowError::DuplicateResident);
        }
    }
}

/// Apply one field edit, then re-run the whole pipeline on the row.
/// Never patches the existing error list.
pub fn apply_edit(
    candidate: &ResidentCandidate,
    field: CandidateField,
    value: &str,
    schema: ImportSchema,
    directory: &UnitDirectory,
    existing: &ExistingResidentIndex,
) -> ResidentCandidate {
    let mut raw = raw_from_candidate(candidate);
    match field {
        CandidateField::Block => raw.block_label = value.to_string(),
        CandidateField::Apartment => raw.apartment_label = value.to_string(),
        CandidateField::Name => raw.full_name = value.to_string(),
        CandidateField::Email => raw.email = value.to_string(),
        CandidateField::Phone => raw.phone = value.to_string(),
        CandidateField::TaxId => raw.tax_id = value.to_string(),
        CandidateField::Owner => raw.owner_token = value.to_string(),
        CandidateField::Responsible => raw.responsible_token = value.to_string(),
    }
    validate_row(&raw, schema, directory, existing)
}

fn raw_from_candidate(candidate: &ResidentCandidate) -> RawRow {
    RawRow {
        line: candidate.line,
        block_label: candidate.block_label.clone(),
        apartment_label: candidate.apartment_label.clone(),
        full_name: candidate.full_name.clone(),
        email: candidate.email.clone(),
        phone: candidate.phone.clone(),
        tax_id: candidate.tax_id.clone(),
        owner_token: if candidate.is_owner { "1" } else { "" }.to_string(),
        responsible_token: if candidate.is_responsible { "1" } else { "" }.to_string(),
    }
}
