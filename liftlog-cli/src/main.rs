//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use liftlog_lib::{
    parse_color, to_display_label, to_storage_key, AppService, ChartMetric, DataPoint,
    DropdownItem, ExerciseLog, ExerciseStore, NutritionFacts, ProductRecord, Units,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli_args = cli::parse_args();

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let header_color = parse_color(&service.config.theme.header_color)
        .map(Color::from)
        .unwrap_or(Color::Green);
    let units = service.config.units;
    debug!("Using store at {}", service.config.store_url);

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {}
        cli::Commands::Exercises => {
            let mut log = service.exercise_log();
            log.load_exercises();
            log.settle().await;
            fail_on_error(&log)?;
            if log.catalog().is_empty() {
                println!("No exercises logged yet.");
            } else {
                print_exercise_table(log.catalog().items(), header_color);
            }
        }
        cli::Commands::History {
            exercise,
            metric,
            csv,
        } => {
            let mut log = service.exercise_log();
            if let Some(metric) = metric {
                log.set_metric(metric.into());
            }
            let metric = log.metric();
            open(&mut log, &exercise).await?;
            if log.points().is_empty() {
                println!("No entries for '{}'.", to_display_label(&to_storage_key(&exercise)));
            } else if csv {
                print_points_csv(log.points(), metric)?;
            } else {
                print_points_table(log.points(), metric, units, header_color);
            }
        }
        cli::Commands::Show { exercise, id } => {
            let mut log = service.exercise_log();
            open(&mut log, &exercise).await?;
            inspect(&mut log, &id).await?;
            if let Some(entry) = log.inspected_entry() {
                for line in entry.summary_lines(units) {
                    println!("{line}");
                }
            }
        }
        cli::Commands::Add {
            exercise,
            weight,
            reps,
            notes,
            date,
        } => {
            let mut log = service.exercise_log();
            open(&mut log, &exercise).await?;
            let form = log.form_mut();
            form.weight = weight;
            form.reps = reps;
            form.notes = notes.unwrap_or_default();
            if let Some(date) = date {
                form.date = local_date_to_utc(date)?;
            }
            if let Err(e) = log.submit() {
                bail!("Error adding entry: {}", e.user_message());
            }
            log.settle().await;
            fail_on_error(&log)?;
            if let Some(notice) = log.notice() {
                println!("{}", notice.message);
            }
            println!(
                "'{}' now has {} entries.",
                to_display_label(log.selected_key().unwrap_or_default()),
                log.points().len()
            );
        }
        cli::Commands::Delete { exercise, id } => {
            let mut log = service.exercise_log();
            open(&mut log, &exercise).await?;
            inspect(&mut log, &id).await?;
            if let Err(e) = log.delete_inspected() {
                bail!("Error deleting entry {}: {}", id, e.user_message());
            }
            log.settle().await;
            fail_on_error(&log)?;
            println!("Successfully deleted entry {id}.");
        }
        cli::Commands::NewExercise { name } => {
            let mut log = service.exercise_log();
            log.load_exercises();
            log.settle().await;
            let picked = log
                .select(DropdownItem::new_exercise())
                .and_then(|()| log.confirm_new_exercise(&name));
            if let Err(e) = picked {
                bail!("Error creating exercise: {}", e.user_message());
            }
            log.settle().await;
            fail_on_error(&log)?;
            if let Some(item) = log.selected_exercise() {
                println!("Exercise '{}' is stored as '{}'.", item.label, item.value);
                if log.points().is_empty() {
                    println!("It appears in the list once an entry is added.");
                } else {
                    println!("It already has {} entries.", log.points().len());
                }
            }
        }
        cli::Commands::Food { command } => match command {
            cli::FoodCommands::Search { query } => {
                let products = service
                    .search_food(&query)
                    .await
                    .map_err(|e| anyhow::anyhow!("Food search failed: {}", e.user_message()))?;
                if products.is_empty() {
                    println!("No products found.");
                } else {
                    print_product_table(&products, header_color);
                }
            }
            cli::FoodCommands::Natural { query } => {
                let foods = service
                    .search_food_natural(&query)
                    .await
                    .map_err(|e| anyhow::anyhow!("Food lookup failed: {}", e.user_message()))?;
                if foods.is_empty() {
                    println!("No foods recognised.");
                } else {
                    print_product_table(&foods, header_color);
                }
            }
            cli::FoodCommands::Barcode { upc, servings } => {
                let facts = service
                    .lookup_barcode(&upc)
                    .await
                    .map_err(|e| anyhow::anyhow!("Barcode lookup failed: {}", e.user_message()))?;
                print_nutrition_facts(&facts, servings);
            }
        },
        cli::Commands::ConfigPath => {
            println!("{}", service.get_config_path().display());
        }
        cli::Commands::SetStoreUrl { url } => {
            service.set_store_url(&url)?;
            println!("Store URL set to {}", service.config.store_url);
        }
        cli::Commands::SetUnits { units } => {
            let units: Units = units.into();
            service.set_units(units)?;
            println!("Units set to {units} ({}).", units.weight_label());
        }
    }

    Ok(())
}

/// Selects `exercise` and waits for its history.
async fn open<S: ExerciseStore + 'static>(log: &mut ExerciseLog<S>, exercise: &str) -> Result<()> {
    let key = to_storage_key(exercise);
    if let Err(e) = log.open_exercise(&key) {
        bail!("Error opening '{}': {}", exercise, e.user_message());
    }
    log.settle().await;
    fail_on_error(log)
}

/// Opens the detail view for entry `id` of the selected exercise.
async fn inspect<S: ExerciseStore + 'static>(log: &mut ExerciseLog<S>, id: &str) -> Result<()> {
    let Some(point) = log.points().iter().find(|p| p.label.as_str() == id).cloned() else {
        bail!(
            "Entry {} does not belong to '{}'.",
            id,
            to_display_label(log.selected_key().unwrap_or_default())
        );
    };
    if let Err(e) = log.click_point(&point) {
        bail!("Error opening entry {}: {}", id, e.user_message());
    }
    log.settle().await;
    fail_on_error(log)
}

fn fail_on_error<S: ExerciseStore + 'static>(log: &ExerciseLog<S>) -> Result<()> {
    if let Some(err) = log.last_error() {
        bail!("{} ({})", err.user_message(), err);
    }
    Ok(())
}

fn local_date_to_utc(date: NaiveDate) -> Result<DateTime<Utc>> {
    let naive = date.and_time(Local::now().time());
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Date {date} has no valid local time"))
}

#[allow(clippy::cast_possible_truncation)]
fn format_millis(x: f64) -> String {
    DateTime::from_timestamp_millis(x as i64).map_or_else(
        || "-".to_string(),
        |dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn metric_header(metric: ChartMetric, units: Units) -> String {
    let unit = units.weight_label();
    match metric {
        ChartMetric::Weight => format!("Weight ({unit})"),
        ChartMetric::Estimated1Rm => format!("Est. 1RM ({unit})"),
        ChartMetric::Volume => format!("Volume ({unit} x reps)"),
    }
}

fn print_exercise_table(items: &[DropdownItem], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new("Key").fg(header_color),
        ]);

    for item in items {
        table.add_row(vec![Cell::new(&item.label), Cell::new(&item.value)]);
    }
    println!("{table}");
}

/// Prints chart points in a formatted table.
fn print_points_table(points: &[DataPoint], metric: ChartMetric, units: Units, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Timestamp (Local)").fg(header_color),
            Cell::new(metric_header(metric, units)).fg(header_color),
        ]);

    for point in points {
        table.add_row(vec![
            Cell::new(point.label.as_str()),
            Cell::new(format_millis(point.x)),
            Cell::new(format!("{:.2}", point.y)),
        ]);
    }
    println!("{table}");
}

fn print_points_csv(points: &[DataPoint], metric: ChartMetric) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let metric_name = metric.to_string();
    writer.write_record(["ID", "Timestamp_Millis", "Timestamp_Local", metric_name.as_str()])?;
    for point in points {
        #[allow(clippy::cast_possible_truncation)]
        let millis = point.x as i64;
        writer.write_record(&[
            point.label.to_string(),
            millis.to_string(),
            format_millis(point.x),
            format!("{:.2}", point.y),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_product_table(products: &[ProductRecord], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Product").fg(header_color),
            Cell::new("Brand").fg(header_color),
            Cell::new("Serving").fg(header_color),
            Cell::new("Calories").fg(header_color),
        ]);

    for product in products {
        let serving = match (product.serving_qty, product.serving_unit.as_deref()) {
            (Some(qty), Some(unit)) => format!("{qty} {unit}"),
            (Some(qty), None) => qty.to_string(),
            _ => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(&product.food_name),
            Cell::new(product.brand_name.as_deref().unwrap_or("-")),
            Cell::new(serving),
            Cell::new(product.nf_calories.map_or("-".to_string(), |c| format!("{c:.0}"))),
        ]);
    }
    println!("{table}");
}

fn print_nutrition_facts(facts: &NutritionFacts, servings: f64) {
    let fmt_opt = |v: Option<f64>, unit: &str| v.map_or("-".to_string(), |v| format!("{v:.1} {unit}"));

    println!("\n--- {} ---", facts.product_name);
    if let Some(brand) = &facts.brand_name {
        println!("Brand: {brand}");
    }
    println!(
        "Serving: {} {} ({})",
        facts.serving.quantity,
        facts.serving_unit.as_deref().unwrap_or("serving"),
        fmt_opt(facts.serving.grams, "g")
    );
    println!("Calories per serving: {:.0}", facts.calories_per_serving);
    if let Some(per_100g) = facts.calories_per_100g {
        println!("Calories per 100 g: {per_100g:.0}");
    }
    let n = &facts.nutrients;
    println!("Fat: {}", fmt_opt(n.total_fat, "g"));
    println!("  Saturated: {}", fmt_opt(n.saturated_fat, "g"));
    println!("Cholesterol: {}", fmt_opt(n.cholesterol, "mg"));
    println!("Sodium: {}", fmt_opt(n.sodium, "mg"));
    println!("Carbohydrates: {}", fmt_opt(n.total_carbs, "g"));
    println!("  Fiber: {}", fmt_opt(n.dietary_fiber, "g"));
    println!("  Sugars: {}", fmt_opt(n.sugars, "g"));
    println!("Protein: {}", fmt_opt(n.protein, "g"));

    if (servings - 1.0).abs() > f64::EPSILON {
        let calc = facts.for_servings(servings);
        println!(
            "\n{} servings: {:.0} calories ({})",
            calc.servings,
            calc.total_calories,
            fmt_opt(calc.requested.grams, "g")
        );
    }
}
