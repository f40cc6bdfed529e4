use crate::commands::{print_json, Context};
use crate::error::{invalid_input, not_found};
use crate::util::{
    normalize_optional_value, parse_amount, parse_customer_id, parse_status, parse_time,
    resolve_disposition,
};
use anyhow::Result;
use clap::Args;
use pledgeline_core::domain::{CustomerContact, CustomerSource, DispositionEvent};
use pledgeline_core::dto::{CustomerDetailDto, CustomerListItemDto, DispositionEventDto};
use pledgeline_core::time::{format_timestamp_date, format_timestamp_datetime};
use pledgeline_store::repo::{CustomerFilter, CustomerNew, CustomerUpdate};
use tracing::debug;

#[derive(Debug, Args)]
pub struct ContactArgs {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub zip: Option<String>,
    /// pc (previous contributor) or cold
    #[arg(long)]
    pub source: Option<String>,
}

/// Fields of a disposition event other than the disposition itself.
#[derive(Debug, Args)]
pub struct EventArgs {
    /// Effective time of the call (YYYY-MM-DD, YYYY-MM-DD HH:MM or MM/DD/YYYY); defaults to now
    #[arg(long)]
    pub at: Option<String>,
    #[arg(long)]
    pub agent: Option<String>,
    #[arg(long)]
    pub amount: Option<String>,
    #[arg(long)]
    pub tickets: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub program: Option<String>,
    #[arg(long)]
    pub lead_list: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddCustomerArgs {
    #[arg(long)]
    pub phone: String,
    #[command(flatten)]
    pub contact: ContactArgs,
    /// First disposition, by id or name
    #[arg(long)]
    pub disposition: Option<String>,
    #[command(flatten)]
    pub event: EventArgs,
}

#[derive(Debug, Args)]
pub struct EditCustomerArgs {
    pub id: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[command(flatten)]
    pub contact: ContactArgs,
}

#[derive(Debug, Args)]
pub struct SetDispositionArgs {
    pub id: String,
    /// Disposition id or name
    pub disposition: String,
    #[command(flatten)]
    pub event: EventArgs,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// active, dnc, timeout, paid, open_order or cancelled
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: String,
}

pub fn add_customer(ctx: &Context<'_>, args: AddCustomerArgs) -> Result<()> {
    let contact = CustomerContact {
        phone: args.phone,
        first_name: args.contact.first_name.unwrap_or_default(),
        last_name: args.contact.last_name.unwrap_or_default(),
        email: args.contact.email.and_then(normalize_optional_value),
        address: args.contact.address.and_then(normalize_optional_value),
        city: args.contact.city.and_then(normalize_optional_value),
        state: args.contact.state.and_then(normalize_optional_value),
        zip: args.contact.zip.and_then(normalize_optional_value),
        source: match args.contact.source {
            Some(raw) => CustomerSource::parse(&raw)?,
            None => CustomerSource::Cold,
        },
    };

    let disposition = match args.disposition {
        Some(raw) => Some(build_event(ctx, &raw, args.event)?),
        None => {
            if event_args_given(&args.event) {
                return Err(invalid_input("event fields require --disposition"));
            }
            None
        }
    };

    let customer = ctx
        .store
        .customers()
        .create(ctx.now, CustomerNew { contact, disposition })?;

    if ctx.json {
        let catalog = ctx.store.dispositions().catalog()?;
        print_json(&CustomerDetailDto::new(&customer, &catalog))?;
    } else {
        println!(
            "created {} {} [{}]",
            customer.id,
            customer.phone,
            customer.status.label()
        );
    }
    Ok(())
}

pub fn edit_customer(ctx: &Context<'_>, args: EditCustomerArgs) -> Result<()> {
    let id = parse_customer_id(&args.id)?;
    let contact = args.contact;

    let mut update = CustomerUpdate::default();
    if let Some(phone) = args.phone {
        update.phone = Some(phone);
    }
    if let Some(first_name) = contact.first_name {
        update.first_name = Some(first_name.trim().to_string());
    }
    if let Some(last_name) = contact.last_name {
        update.last_name = Some(last_name.trim().to_string());
    }
    if let Some(email) = contact.email {
        update.email = Some(normalize_optional_value(email));
    }
    if let Some(address) = contact.address {
        update.address = Some(normalize_optional_value(address));
    }
    if let Some(city) = contact.city {
        update.city = Some(normalize_optional_value(city));
    }
    if let Some(state) = contact.state {
        update.state = Some(normalize_optional_value(state));
    }
    if let Some(zip) = contact.zip {
        update.zip = Some(normalize_optional_value(zip));
    }
    if let Some(source) = contact.source {
        update.source = Some(CustomerSource::parse(&source)?);
    }

    if update_is_empty(&update) {
        return Err(invalid_input("no updates provided"));
    }

    let customer = ctx.store.customers().update(ctx.now, id, update)?;
    if ctx.json {
        let catalog = ctx.store.dispositions().catalog()?;
        print_json(&CustomerDetailDto::new(&customer, &catalog))?;
    } else {
        println!("updated {} {}", customer.id, customer.display_name());
    }
    Ok(())
}

pub fn set_disposition(ctx: &Context<'_>, args: SetDispositionArgs) -> Result<()> {
    let id = parse_customer_id(&args.id)?;
    let event = build_event(ctx, &args.disposition, args.event)?;
    let (customer, appended) = ctx
        .store
        .customers()
        .update_disposition(ctx.now, id, event)?;
    debug!(customer = %customer.id, appended, "disposition recorded");

    if ctx.json {
        let catalog = ctx.store.dispositions().catalog()?;
        print_json(&CustomerDetailDto::new(&customer, &catalog))?;
    } else if appended {
        println!(
            "recorded disposition for {} [{}]",
            customer.id,
            status_text(customer.status.label(), customer.status.detail())
        );
    } else {
        println!("no change for {}", customer.id);
    }
    Ok(())
}

pub fn show_customer(ctx: &Context<'_>, args: ShowArgs) -> Result<()> {
    let id = parse_customer_id(&args.id)?;
    let customer = ctx
        .store
        .customers()
        .get(id)?
        .ok_or_else(|| not_found("customer not found"))?;
    let catalog = ctx.store.dispositions().catalog()?;
    let detail = CustomerDetailDto::new(&customer, &catalog);

    if ctx.json {
        return print_json(&detail);
    }

    println!("{}  {}", detail.id, customer.display_name());
    println!("phone: {}", detail.phone);
    if let Some(email) = &detail.email {
        println!("email: {}", email);
    }
    let address: Vec<&str> = [&detail.address, &detail.city, &detail.state, &detail.zip]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .collect();
    if !address.is_empty() {
        println!("address: {}", address.join(", "));
    }
    println!("source: {}", detail.source);
    println!(
        "status: {}",
        status_text(&detail.status, detail.status_detail.clone())
    );
    if let Some(current) = &detail.current {
        println!("current: {}", format_event_line(current));
    }
    if !detail.history.is_empty() {
        println!("history:");
        for event in &detail.history {
            println!("- {}", format_event_line(event));
        }
    }
    Ok(())
}

pub fn list_customers(ctx: &Context<'_>, args: ListArgs) -> Result<()> {
    let filter = CustomerFilter {
        status: args.status.as_deref().map(parse_status).transpose()?,
        phone: args.phone,
    };
    let customers = ctx.store.customers().list(&filter)?;
    let catalog = ctx.store.dispositions().catalog()?;
    let items: Vec<CustomerListItemDto> = customers
        .iter()
        .map(|customer| CustomerListItemDto::new(customer, &catalog))
        .collect();

    if ctx.json {
        return print_json(&items);
    }

    for item in items {
        let name = if item.display_name.is_empty() {
            "(no name)"
        } else {
            item.display_name.as_str()
        };
        let mut line = format!(
            "{}  {}  {}  [{}]",
            item.id,
            item.phone,
            name,
            status_text(&item.status, item.status_detail.clone())
        );
        if let (Some(disposition), Some(at)) = (&item.disposition, item.disposition_time) {
            line.push_str(&format!("  {} {}", disposition, format_timestamp_date(at)));
        }
        println!("{}", line);
    }
    Ok(())
}

pub fn delete_customer(ctx: &Context<'_>, args: DeleteArgs) -> Result<()> {
    let id = parse_customer_id(&args.id)?;
    ctx.store.customers().delete(id)?;
    if ctx.json {
        print_json(&serde_json::json!({ "deleted": id }))?;
    } else {
        println!("deleted {}", id);
    }
    Ok(())
}

fn build_event(ctx: &Context<'_>, disposition: &str, args: EventArgs) -> Result<DispositionEvent> {
    let disposition = resolve_disposition(ctx, disposition)?;
    let at = match args.at.as_deref() {
        Some(raw) => parse_time(raw)?,
        None => ctx.now,
    };
    let agent = args.agent.unwrap_or_default();
    let mut event = DispositionEvent::new(disposition.id, at, agent.trim());
    event.amount_cents = args.amount.as_deref().map(parse_amount).transpose()?;
    event.tickets_ad = args.tickets.and_then(normalize_optional_value);
    event.notes = args.notes.unwrap_or_default();
    event.program = args.program.and_then(normalize_optional_value);
    event.lead_list = args.lead_list.and_then(normalize_optional_value);
    Ok(event)
}

fn event_args_given(args: &EventArgs) -> bool {
    args.at.is_some()
        || args.agent.is_some()
        || args.amount.is_some()
        || args.tickets.is_some()
        || args.notes.is_some()
        || args.program.is_some()
        || args.lead_list.is_some()
}

fn status_text(label: &str, detail: Option<String>) -> String {
    match detail {
        Some(detail) => format!("{label} {detail}"),
        None => label.to_string(),
    }
}

fn format_event_line(event: &DispositionEventDto) -> String {
    let mut line = format!(
        "{}  {}",
        format_timestamp_datetime(event.disposition_time),
        event.disposition
    );
    if !event.agent_number.is_empty() {
        line.push_str(&format!("  agent {}", event.agent_number));
    }
    if let Some(amount) = &event.amount {
        line.push_str(&format!("  ${amount}"));
    }
    if !event.notes.is_empty() {
        line.push_str(&format!("  \"{}\"", event.notes));
    }
    line
}

fn update_is_empty(update: &CustomerUpdate) -> bool {
    update.phone.is_none()
        && update.first_name.is_none()
        && update.last_name.is_none()
        && update.email.is_none()
        && update.address.is_none()
        && update.city.is_none()
        && update.state.is_none()
        && update.zip.is_none()
        && update.source.is_none()
}
