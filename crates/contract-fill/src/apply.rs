//! Application record to contract mapping
//!
//! Walks every section of the contract, rendering whichever values the
//! application snapshot carries. Absent optional values are left alone so
//! the pre-printed blanks stay visible for manual completion.

use lease_types::ApplicationRecord;
use tracing::warn;

use crate::error::FillError;
use crate::fields::{Registry, Variant};
use crate::renderer::ContractRenderer;

/// Fill the built-in contract layout with `record` and return the
/// finalized bytes. Any field failure aborts the render; use
/// [`fill_application_with`] to skip bad fields instead.
pub fn fill_application(
    template: &[u8],
    record: &ApplicationRecord,
) -> Result<Vec<u8>, FillError> {
    let mut renderer = ContractRenderer::new(template, Registry::builtin())?;
    fill_application_with(&mut renderer, record, false)?;
    renderer.finalize()
}

/// Render `record` onto an already-constructed renderer. With
/// `skip_failed_fields`, a field that fails to render (or does not exist in
/// the renderer's registry) is logged and skipped rather than aborting the
/// whole document; the registry-validation and finalize errors still
/// propagate.
pub fn fill_application_with(
    renderer: &mut ContractRenderer<'_>,
    record: &ApplicationRecord,
    skip_failed_fields: bool,
) -> Result<(), FillError> {
    use Variant::*;
    let skip = skip_failed_fields;

    // Lessee schedule.
    guard(
        renderer.render_field(Lessee, "entity_name", &record.entity_name, None),
        skip,
    )?;
    opt(renderer, skip, Lessee, "trading_name", record.trading_name.as_deref())?;
    opt(renderer, skip, Lessee, "abn", record.abn.as_deref())?;
    opt(renderer, skip, Lessee, "address", record.address_line().as_deref())?;
    opt(renderer, skip, Lessee, "phone", record.phone.as_deref())?;
    opt(renderer, skip, Lessee, "email", record.email.as_deref())?;

    if let Some(finance) = &record.finance {
        opt(renderer, skip, Lessee, "amount_financed", finance.amount_financed.as_deref())?;
        opt(renderer, skip, Lessee, "term_months", finance.term_months.as_deref())?;
        opt(renderer, skip, Lessee, "repayment", finance.repayment.as_deref())?;
        opt(renderer, skip, Lessee, "repayment_frequency", finance.frequency.as_deref())?;
    }

    opt(
        renderer,
        skip,
        Lessee,
        "special_conditions",
        record.special_conditions.as_deref(),
    )?;

    // Director block, schedule page and execution page.
    let director_names: Vec<&str> = record.directors.iter().map(|d| d.name.as_str()).collect();
    let director_positions: Vec<&str> = record
        .directors
        .iter()
        .map(|d| d.position.as_deref().unwrap_or(""))
        .collect();
    guard(
        renderer.render_repeated_field(Lessee, "director_name", &director_names),
        skip,
    )?;
    guard(
        renderer.render_repeated_field(Lessee, "director_position", &director_positions),
        skip,
    )?;
    guard(
        renderer.render_repeated_field(LesseePage4, "director_name", &director_names),
        skip,
    )?;
    opt(renderer, skip, LesseePage4, "entity_name", Some(&record.entity_name))?;
    opt(renderer, skip, LesseePage4, "abn", record.abn.as_deref())?;

    // Guarantee and indemnity.
    if !record.guarantors.is_empty() {
        let names: Vec<&str> = record.guarantors.iter().map(|g| g.name.as_str()).collect();
        let addresses: Vec<&str> = record
            .guarantors
            .iter()
            .map(|g| g.address.as_deref().unwrap_or(""))
            .collect();
        opt(renderer, skip, Guarantee, "entity_name", Some(&record.entity_name))?;
        guard(
            renderer.render_repeated_field(Guarantee, "guarantor_name", &names),
            skip,
        )?;
        guard(
            renderer.render_repeated_field(Guarantee, "guarantor_address", &addresses),
            skip,
        )?;
    }

    // Direct debit request.
    if let Some(bank) = &record.bank {
        opt(renderer, skip, DirectDebit, "entity_name", Some(&record.entity_name))?;
        opt(renderer, skip, DirectDebit, "account_name", Some(&bank.account_name))?;
        opt(renderer, skip, DirectDebit, "bsb", Some(&bank.bsb))?;
        opt(renderer, skip, DirectDebit, "account_number", Some(&bank.account_number))?;
        opt(renderer, skip, DirectDebit, "institution", bank.institution.as_deref())?;
    }

    // Equipment: summary rows plus the full schedule grid.
    if !record.equipment.is_empty() {
        let descriptions: Vec<&str> = record
            .equipment
            .iter()
            .map(|e| e.description.as_str())
            .collect();
        let quantities: Vec<&str> = record
            .equipment
            .iter()
            .map(|e| e.quantity.as_deref().unwrap_or(""))
            .collect();
        let serials: Vec<&str> = record
            .equipment
            .iter()
            .map(|e| e.serial.as_deref().unwrap_or(""))
            .collect();
        let prices: Vec<&str> = record
            .equipment
            .iter()
            .map(|e| e.unit_price.as_deref().unwrap_or(""))
            .collect();
        guard(
            renderer.render_repeated_field(Lessee, "equipment_description", &descriptions),
            skip,
        )?;
        guard(
            renderer.render_repeated_field(Lessee, "equipment_quantity", &quantities),
            skip,
        )?;
        guard(
            renderer.render_repeated_field(EquipmentSchedule, "equipment_description", &descriptions),
            skip,
        )?;
        guard(
            renderer.render_repeated_field(EquipmentSchedule, "equipment_serial", &serials),
            skip,
        )?;
        guard(
            renderer.render_repeated_field(EquipmentSchedule, "equipment_quantity", &quantities),
            skip,
        )?;
        guard(
            renderer.render_repeated_field(EquipmentSchedule, "equipment_unit_price", &prices),
            skip,
        )?;
    }

    // Applicant signature on the schedule and the execution page.
    if let Some(png) = &record.signature_png {
        guard(renderer.render_signature(Variant::Lessee, png), skip)?;
        guard(renderer.render_signature(Variant::LesseePage4, png), skip)?;
    }

    Ok(())
}

fn opt(
    renderer: &mut ContractRenderer<'_>,
    skip: bool,
    variant: Variant,
    name: &str,
    value: Option<&str>,
) -> Result<(), FillError> {
    match value {
        Some(value) => guard(renderer.render_field(variant, name, value, None), skip),
        None => Ok(()),
    }
}

fn guard(result: Result<(), FillError>, skip: bool) -> Result<(), FillError> {
    match result {
        Err(e @ (FillError::Render { .. } | FillError::FieldNotFound(_))) if skip => {
            warn!(error = %e, "skipping failed field");
            Ok(())
        }
        other => other,
    }
}
