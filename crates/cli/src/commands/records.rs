//! List, create, update and delete for the five list screens.

use std::io::Write;

use schoolsoft_admin::api::Entity;
use schoolsoft_admin::components::{Applied, DataTableConfig, SortDescriptor, TableState};
use schoolsoft_admin::forms::PaymentForm;
use schoolsoft_admin::state::AppState;
use schoolsoft_admin::views::{ListView, Record};
use schoolsoft_core::{Payment, StudentId};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{CliError, FieldArg, apply_fields, finish_submit};
use crate::output::{write_page_footer, write_table};
use crate::{ListArgs, RecordAction};

/// Rows fetched per page while looking a record up by id.
const SCAN_PAGE_SIZE: u32 = 100;

pub async fn run<T: Record>(
    state: &AppState,
    action: RecordAction,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut view = ListView::<T>::new(state.client().clone(), state.cache().clone())?;

    match action {
        RecordAction::List(args) => list(&mut view, &args, out).await,
        RecordAction::Create { fields } => {
            let mut modal = view.create_form();
            apply_fields(&mut modal, &fields)?;
            finish_submit(view.submit(&mut modal).await, out)
        }
        RecordAction::Update { id, fields } => {
            locate(&mut view, id).await?;
            let mut modal = view.edit_form(id).ok_or_else(|| not_found(T::ENTITY, id))?;
            apply_fields(&mut modal, &fields)?;
            finish_submit(view.submit(&mut modal).await, out)
        }
        RecordAction::Delete { id, yes } => delete(&mut view, id, yes, out).await,
    }
}

/// Payments go through the payment modal so the student drives the class.
pub async fn run_payments(
    state: &AppState,
    action: RecordAction,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut view = ListView::<Payment>::new(state.client().clone(), state.cache().clone())?;

    match action {
        RecordAction::List(args) => list(&mut view, &args, out).await,
        RecordAction::Create { fields } => save_payment(state, None, &fields, out).await,
        RecordAction::Update { id, fields } => {
            locate(&mut view, id).await?;
            let payment = view
                .page()
                .items
                .iter()
                .find(|row| row.id.as_i32() == id)
                .cloned()
                .ok_or_else(|| not_found(Entity::Payment, id))?;
            save_payment(state, Some(&payment), &fields, out).await
        }
        RecordAction::Delete { id, yes } => delete(&mut view, id, yes, out).await,
    }
}

async fn list<T: Record>(
    view: &mut ListView<T>,
    args: &ListArgs,
    out: &mut impl Write,
) -> Result<(), CliError> {
    apply_list_args(view, args)?;
    if view.refresh().await == Applied::Failed {
        return Err(CliError::Failed(format!(
            "Failed to load {}",
            view.config().table_id
        )));
    }

    write_table(out, view.config(), &view.page().items)?;
    write_page_footer(out, args.page, view.page())?;
    Ok(())
}

async fn delete<T: Record>(
    view: &mut ListView<T>,
    id: i32,
    confirmed: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    view.request_delete(id);
    if !confirmed {
        view.cancel_delete();
        return Err(CliError::Usage(format!(
            "Deleting {} {id} cannot be undone; pass --yes to confirm",
            T::ENTITY.label().to_lowercase()
        )));
    }
    match view.confirm_delete().await {
        Some(notice) if notice.is_error() => Err(CliError::Failed(notice.message)),
        Some(notice) => {
            writeln!(out, "{}", notice.message)?;
            Ok(())
        }
        None => Ok(()),
    }
}

/// Apply `--page`, `--size`, `--filter`, `--sort` and `--search` to a view.
pub fn apply_list_args<T: DeserializeOwned>(
    view: &mut ListView<T>,
    args: &ListArgs,
) -> Result<(), CliError> {
    let next = table_state(view.config(), args)?;
    view.update_state(|state| *state = next);
    Ok(())
}

fn table_state(config: &DataTableConfig, args: &ListArgs) -> Result<TableState, CliError> {
    if args.page == 0 {
        return Err(CliError::Usage("--page starts at 1".to_string()));
    }

    let mut state = TableState::default();
    state.set_page_size(args.size);

    for filter in &args.filters {
        if !config.can_filter(&filter.name) {
            return Err(CliError::Usage(format!(
                "cannot filter {} by `{}`",
                config.table_id, filter.name
            )));
        }
        state.set_column_filter(&filter.name, Value::String(filter.value.clone()));
    }

    let sorting = args
        .sorting
        .iter()
        .map(|raw| parse_sort(raw))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(bad) = sorting.iter().find(|sort| !config.can_sort(&sort.id)) {
        return Err(CliError::Usage(format!(
            "cannot sort {} by `{}`",
            config.table_id, bad.id
        )));
    }
    state.set_sorting(sorting);

    if let Some(search) = &args.search {
        state.set_global_filter(search);
    }
    state.set_page_index(args.page - 1);
    Ok(state)
}

/// Parse `column` or `column:desc` / `column:asc`.
pub fn parse_sort(raw: &str) -> Result<SortDescriptor, CliError> {
    match raw.rsplit_once(':') {
        None => Ok(SortDescriptor::asc(raw)),
        Some((id, "desc")) => Ok(SortDescriptor::desc(id)),
        Some((id, "asc")) => Ok(SortDescriptor::asc(id)),
        Some((_, other)) => Err(CliError::Usage(format!(
            "sort direction must be `asc` or `desc`, got `{other}`"
        ))),
    }
}

/// Page through the list until the row `id` is on screen.
pub async fn locate<T: Record>(view: &mut ListView<T>, id: i32) -> Result<(), CliError> {
    view.update_state(|state| state.set_page_size(SCAN_PAGE_SIZE));
    let mut page_index = 0;
    loop {
        view.update_state(|state| state.set_page_index(page_index));
        let ticket = view.start_fetch();
        let page = view.fetch(&ticket).await?;
        let total_pages = page.total_pages;
        let exhausted = page.is_empty();
        view.complete(&ticket, Ok(page));

        if view.page().items.iter().any(|row| row.record_id() == id) {
            return Ok(());
        }
        page_index += 1;
        if exhausted || u64::from(page_index) >= total_pages {
            return Err(not_found(T::ENTITY, id));
        }
    }
}

/// Create, or with `existing` update, a payment through the payment modal.
async fn save_payment(
    state: &AppState,
    existing: Option<&Payment>,
    fields: &[FieldArg],
    out: &mut impl Write,
) -> Result<(), CliError> {
    let students = state.cache().students().await?.value;
    let mut form = match existing {
        Some(payment) => PaymentForm::update(payment, students),
        None => PaymentForm::create(students),
    };

    let (student, rest): (Vec<&FieldArg>, Vec<&FieldArg>) =
        fields.iter().partition(|field| field.name == "studentId");
    if let Some(student) = student.last() {
        let id = student
            .value
            .trim()
            .parse::<i32>()
            .map_err(|_| CliError::Usage(format!("invalid studentId `{}`", student.value)))?;
        form.select_student(Some(StudentId::new(id)));
    }
    let rest: Vec<FieldArg> = rest.into_iter().cloned().collect();
    apply_fields(form.modal_mut(), &rest)?;

    writeln!(out, "Amount due: {}", form.amount_due_display())?;
    let outcome = form.submit(state.client(), state.cache()).await;
    finish_submit(outcome, out)
}

fn not_found(entity: Entity, id: i32) -> CliError {
    CliError::App(schoolsoft_admin::AppError::NotFound(format!(
        "{} {id}",
        entity.label().to_lowercase()
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use schoolsoft_admin::components::data_table::{payments_table_config, students_table_config};

    use super::*;

    fn base_args() -> ListArgs {
        ListArgs {
            page: 1,
            size: 10,
            ..ListArgs::default()
        }
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("last_name").unwrap(), SortDescriptor::asc("last_name"));
        assert_eq!(parse_sort("amount:desc").unwrap(), SortDescriptor::desc("amount"));
        assert!(parse_sort("amount:down").is_err());
    }

    #[test]
    fn test_table_state_from_args() {
        let args = ListArgs {
            page: 3,
            size: 20,
            filters: vec!["payment_mode=MPESA".parse().unwrap()],
            sorting: vec!["amount:desc".to_string()],
            search: None,
        };
        let state = table_state(&payments_table_config(), &args).unwrap();
        assert_eq!(state.pagination.page_index, 2);
        assert_eq!(state.pagination.page_size, 20);
        assert_eq!(state.column_filters.len(), 1);
        assert_eq!(state.sorting, vec![SortDescriptor::desc("amount")]);
    }

    #[test]
    fn test_search_keeps_requested_page() {
        let args = ListArgs {
            page: 2,
            search: Some("amina".to_string()),
            ..base_args()
        };
        let state = table_state(&students_table_config(), &args).unwrap();
        assert_eq!(state.pagination.page_index, 1);
        assert_eq!(state.search_term(), Some("amina"));
    }

    #[test]
    fn test_unknown_columns_rejected() {
        let args = ListArgs {
            filters: vec!["colour=red".parse().unwrap()],
            ..base_args()
        };
        assert!(table_state(&students_table_config(), &args).is_err());

        let args = ListArgs {
            sorting: vec!["colour".to_string()],
            ..base_args()
        };
        assert!(table_state(&students_table_config(), &args).is_err());

        let args = ListArgs { page: 0, ..base_args() };
        assert!(table_state(&students_table_config(), &args).is_err());
    }
}
