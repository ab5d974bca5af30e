//! Commands for the single-field entities: ingredients, steps, techniques.

use clap::{Args, Subcommand};
use cookbook::db::{EntityId, EntityStore};
use cookbook::EntityService;
use cookbook_core::{Entity, Ingredient, RecipeRef, Step, Technique};
use std::fmt::Display;
use std::str::FromStr;

use super::{confirm, OutputFormat};

/// An entity described by one line of text.
pub trait CatalogEntry: Entity + Display {
    /// Label for the text column in listings
    const FIELD: &'static str;

    fn from_text(text: &str) -> Self;

    fn text(&self) -> &str;

    /// Recipes referring to this entry, when loaded
    fn recipes(&self) -> &[RecipeRef] {
        &[]
    }
}

impl CatalogEntry for Ingredient {
    const FIELD: &'static str = "NAME";

    fn from_text(text: &str) -> Self {
        Ingredient::new(text)
    }

    fn text(&self) -> &str {
        &self.name
    }

    fn recipes(&self) -> &[RecipeRef] {
        &self.recipes
    }
}

impl CatalogEntry for Step {
    const FIELD: &'static str = "ACTION";

    fn from_text(text: &str) -> Self {
        Step::new(text)
    }

    fn text(&self) -> &str {
        &self.action
    }

    fn recipes(&self) -> &[RecipeRef] {
        &self.recipes
    }
}

impl CatalogEntry for Technique {
    const FIELD: &'static str = "DESCRIPTION";

    fn from_text(text: &str) -> Self {
        Technique::new(text)
    }

    fn text(&self) -> &str {
        &self.description
    }
}

#[derive(Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand)]
pub enum CatalogSubcommand {
    /// Add a new entry
    Add {
        /// Name, action or description
        text: String,
    },

    /// List all entries
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show an entry and the recipes using it
    Show {
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete an entry
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Search the index
    Search {
        query: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn parse_id<I>(raw: &str) -> Result<I, Box<dyn std::error::Error>>
where
    I: FromStr,
    I::Err: Display,
{
    raw.parse()
        .map_err(|e| format!("Invalid ID '{}': {}", raw, e).into())
}

fn print_entries<E: CatalogEntry>(
    entries: &[E],
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No {} found", E::PLURAL);
                return Ok(());
            }
            println!("{:<36}  {}", "ID", E::FIELD);
            println!("{}", "-".repeat(80));
            for entry in entries {
                let id = entry.id().map(ToString::to_string).unwrap_or_default();
                println!("{:<36}  {}", id, entry.text());
            }
            println!("\nTotal: {} {}", entries.len(), E::PLURAL);
        }
    }
    Ok(())
}

impl CatalogCommand {
    pub async fn run<S>(&self, service: &EntityService<S>) -> Result<(), Box<dyn std::error::Error>>
    where
        S: EntityStore,
        S::Entity: CatalogEntry,
        EntityId<S>: FromStr,
        <EntityId<S> as FromStr>::Err: Display,
    {
        let name = S::Entity::NAME;

        match &self.command {
            CatalogSubcommand::Add { text } => {
                if text.trim().is_empty() {
                    return Err(format!("The {} cannot be empty", S::Entity::FIELD.to_lowercase()).into());
                }

                let created = service.create(S::Entity::from_text(text.trim())).await?;
                println!("Created {}: {}", name, created);
                Ok(())
            }

            CatalogSubcommand::List { format } => {
                let entries = service.find_all(None, false).await?;
                print_entries(&entries, format)
            }

            CatalogSubcommand::Show { id, format } => {
                let id: EntityId<S> = parse_id(id)?;
                let entry = service
                    .find_by_id(&id)
                    .await?
                    .ok_or_else(|| format!("{} not found: {}", name, id))?;

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
                    OutputFormat::Text => {
                        println!("{}", entry);
                        if !entry.recipes().is_empty() {
                            println!("\nUsed in:");
                            for recipe in entry.recipes() {
                                println!("  - {} (#{})", recipe.name, recipe.id);
                            }
                        }
                    }
                }
                Ok(())
            }

            CatalogSubcommand::Delete { id, force } => {
                let id: EntityId<S> = parse_id(id)?;
                let entry = service
                    .find_by_id(&id)
                    .await?
                    .ok_or_else(|| format!("{} not found: {}", name, id))?;

                if !force && !confirm(&format!("Delete {} '{}'?", name, entry.text()))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                service.delete(&id).await?;
                println!("Deleted {}: {}", name, entry.text());
                Ok(())
            }

            CatalogSubcommand::Search { query, format } => {
                let entries = service.search(query).await?;
                print_entries(&entries, format)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<i64>("12").unwrap(), 12);
        assert!(parse_id::<i64>("twelve").is_err());
        assert_eq!(parse_id::<String>("abc").unwrap(), "abc");
    }

    #[test]
    fn test_from_text() {
        assert_eq!(Step::from_text("Stir").text(), "Stir");
        assert_eq!(Technique::from_text("Searing").description, "Searing");
    }
}
