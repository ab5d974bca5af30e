use clap::{Args, Subcommand};
use cookbook::db::RecipeRepository;
use cookbook::EntityService;
use cookbook_core::{Cooking, Ingredient, Recipe, RecipePatch, Step};

use super::{confirm, OutputFormat};

#[derive(Args)]
pub struct RecipeCommand {
    #[command(subcommand)]
    pub command: RecipeSubcommand,
}

#[derive(Subcommand)]
pub enum RecipeSubcommand {
    /// Create a new recipe
    Add {
        /// Name of the recipe
        #[arg(long)]
        name: String,

        /// Cooking method (with-cooking, without-cooking)
        #[arg(long)]
        cooking: Cooking,

        /// Cooking time in minutes
        #[arg(long)]
        cooking_time: Option<f64>,

        /// Ingredient ID (can be repeated)
        #[arg(long = "ingredient", value_name = "ID")]
        ingredients: Vec<i64>,

        /// Step ID (can be repeated)
        #[arg(long = "step", value_name = "ID")]
        steps: Vec<i64>,
    },

    /// Change fields of a recipe, leaving the others as they are
    Update {
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New cooking method
        #[arg(long)]
        cooking: Option<Cooking>,

        /// New cooking time in minutes
        #[arg(long)]
        cooking_time: Option<f64>,
    },

    /// Replace the ingredients and steps of a recipe
    Link {
        id: i64,

        /// Ingredient ID (can be repeated)
        #[arg(long = "ingredient", value_name = "ID")]
        ingredients: Vec<i64>,

        /// Step ID (can be repeated)
        #[arg(long = "step", value_name = "ID")]
        steps: Vec<i64>,
    },

    /// List all recipes
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a recipe with its ingredients and steps
    Show {
        id: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a recipe
    Delete {
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Search recipes by name, cooking method, ingredients or steps
    Search {
        query: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn print_recipes(recipes: &[Recipe], format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(recipes)?);
        }
        OutputFormat::Text => {
            if recipes.is_empty() {
                println!("No recipes found");
                return Ok(());
            }
            println!("{:<6}  {:<30}  {:<16}  TIME", "ID", "NAME", "COOKING");
            println!("{}", "-".repeat(70));
            for recipe in recipes {
                let id = recipe.id.map(|id| id.to_string()).unwrap_or_default();
                let name = if recipe.name.chars().count() > 30 {
                    format!("{}...", recipe.name.chars().take(27).collect::<String>())
                } else {
                    recipe.name.clone()
                };
                let time = recipe
                    .cooking_time
                    .map(|t| format!("{} min", t))
                    .unwrap_or_default();
                println!("{:<6}  {:<30}  {:<16}  {}", id, name, recipe.cooking, time);
            }
            println!("\nTotal: {} recipe(s)", recipes.len());
        }
    }
    Ok(())
}

impl RecipeCommand {
    pub async fn run(
        &self,
        service: &EntityService<RecipeRepository>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RecipeSubcommand::Add {
                name,
                cooking,
                cooking_time,
                ingredients,
                steps,
            } => {
                let mut recipe = Recipe::new(name.trim(), *cooking)
                    .with_ingredients(ingredients.iter().copied().map(Ingredient::reference).collect())
                    .with_steps(steps.iter().copied().map(Step::reference).collect());
                if let Some(minutes) = cooking_time {
                    recipe = recipe.with_cooking_time(*minutes);
                }

                let created = service.create(recipe).await?;
                println!("Created recipe:");
                println!("{}", created);
                Ok(())
            }

            RecipeSubcommand::Update {
                id,
                name,
                cooking,
                cooking_time,
            } => {
                if name.is_none() && cooking.is_none() && cooking_time.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let patch = RecipePatch {
                    id: Some(*id),
                    name: name.clone(),
                    cooking: *cooking,
                    cooking_time: *cooking_time,
                    ..Default::default()
                };
                let updated = service.partial_update(id, patch).await?;
                println!("Updated recipe:");
                println!("{}", updated);
                Ok(())
            }

            RecipeSubcommand::Link {
                id,
                ingredients,
                steps,
            } => {
                let recipe = service
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| format!("Recipe not found: {}", id))?
                    .with_ingredients(ingredients.iter().copied().map(Ingredient::reference).collect())
                    .with_steps(steps.iter().copied().map(Step::reference).collect());

                let updated = service.full_update(id, recipe).await?;
                println!("Updated recipe:");
                println!("{}", updated);
                Ok(())
            }

            RecipeSubcommand::List { format } => {
                let recipes = service.find_all(None, false).await?;
                print_recipes(&recipes, format)
            }

            RecipeSubcommand::Show { id, format } => {
                let recipe = service
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| format!("Recipe not found: {}", id))?;

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&recipe)?),
                    OutputFormat::Text => println!("{}", recipe),
                }
                Ok(())
            }

            RecipeSubcommand::Delete { id, force } => {
                let recipe = service
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| format!("Recipe not found: {}", id))?;

                if !force && !confirm(&format!("Delete recipe '{}'?", recipe.name))? {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                service.delete(id).await?;
                println!("Deleted recipe: {}", recipe.name);
                Ok(())
            }

            RecipeSubcommand::Search { query, format } => {
                let recipes = service.search(query).await?;
                print_recipes(&recipes, format)
            }
        }
    }
}
