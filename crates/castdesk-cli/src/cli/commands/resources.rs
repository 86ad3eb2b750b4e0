//! Resource command handlers shared by customers, broadcasts, templates and admins.

use anyhow::{Context, Result};
use castdesk_core::Console;
use castdesk_core::dates;
use castdesk_core::entities::EntityId;
use castdesk_core::slice::{DateRange, FilterSet, Resource, Slice};
use castdesk_core::ui::{Severity, UiStore};
use serde::de::DeserializeOwned;

use crate::cli::render::{self, Row};
use crate::cli::{ListArgs, ResourceCommands};

pub async fn run<R>(slice: &Slice<R>, command: ResourceCommands, ui: &UiStore) -> Result<()>
where
    R: Resource<Id = EntityId>,
    R::Entity: Row,
    R::Draft: DeserializeOwned,
    R::Patch: DeserializeOwned,
{
    match command {
        ResourceCommands::List(args) => list(slice, &args).await,
        ResourceCommands::Show { id, json } => {
            let entity = slice.get_one(&id).await?;
            if json {
                render::print_json(&entity)
            } else {
                render::print_detail(&entity);
                Ok(())
            }
        }
        ResourceCommands::Create { data } => {
            let draft: R::Draft = parse_payload(&data)?;
            let created = slice.create(&draft).await?;
            ui.notify(
                Severity::Success,
                format!("Created {} {}", R::SINGULAR, R::id(&created)),
            );
            Ok(())
        }
        ResourceCommands::Update { id, data } => {
            let patch: R::Patch = parse_payload(&data)?;
            slice.update(&id, &patch).await?;
            ui.notify(Severity::Success, format!("Updated {} {id}", R::SINGULAR));
            Ok(())
        }
        ResourceCommands::Delete { id } => {
            slice.delete(&id).await?;
            ui.notify(Severity::Success, format!("Deleted {} {id}", R::SINGULAR));
            Ok(())
        }
    }
}

async fn list<R>(slice: &Slice<R>, args: &ListArgs) -> Result<()>
where
    R: Resource,
    R::Entity: Row,
{
    let page = slice.list(args.page, filters_from(args)?).await?;
    if args.json {
        return render::print_json(&page.items);
    }
    if page.items.is_empty() {
        println!("No {} found.", R::PLURAL);
    } else {
        for item in &page.items {
            println!("{}", item.row());
        }
    }
    println!("Page {} of {}", page.current_page, page.total_pages);
    Ok(())
}

pub async fn broadcast_tags(console: &Console) -> Result<()> {
    let tags = console.broadcasts.fetch_filter_tags().await?;
    if tags.is_empty() {
        println!("No tags found.");
    }
    for tag in tags {
        println!("{tag}");
    }
    Ok(())
}

fn filters_from(args: &ListArgs) -> Result<FilterSet> {
    let date_range = match (args.from.as_deref(), args.to.as_deref()) {
        (Some(from), Some(to)) => {
            let start = dates::parse_timestamp(from)
                .with_context(|| format!("Invalid --from date: {from}"))?;
            let end =
                dates::parse_range_end(to).with_context(|| format!("Invalid --to date: {to}"))?;
            if end < start {
                anyhow::bail!("--to must not be before --from");
            }
            DateRange::new(start, end)
        }
        _ => DateRange::default(),
    };
    Ok(FilterSet {
        status: args.status.clone(),
        tags: args.tags.clone(),
        date_range,
        text: args.filter.clone(),
    })
}

fn parse_payload<T: DeserializeOwned>(data: &str) -> Result<T> {
    serde_json::from_str(data).context("Invalid JSON payload")
}
