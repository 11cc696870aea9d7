//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdout};

use workout_lib::{
    get_data_dir_util, EditSetParams, Exercise, ExerciseProgress, ExerciseUpdate, LogSetsParams,
    NewRecord, PersonalRecords, Profiles, RecordSet, StartParams, Template, TemplateUpdate, Units,
    WeightInput, Workout, WorkoutService,
};

fn main() -> Result<()> {
    let cli_args = cli::parse_args(); // Parse arguments once
    init_logging(cli_args.verbose);
    let export_csv = cli_args.csv;
    let profile = cli_args.profile.as_deref();

    // --- Commands that don't need a resolved profile ---
    match cli_args.command {
        cli::Commands::GenerateCompletion { shell } => {
            let mut cmd = cli::build_cli_command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
            return Ok(());
        }
        cli::Commands::Profile { command } => return run_profile_command(command),
        command => {
            let mut service = WorkoutService::initialize(profile)
                .context("Failed to initialize workout service")?;
            run_command(&mut service, command, export_csv)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run_profile_command(command: cli::ProfileCommands) -> Result<()> {
    let base_dir = get_data_dir_util().context("Failed to determine workout data directory")?;
    let profiles = Profiles::new(base_dir);
    match command {
        cli::ProfileCommands::List => {
            let names = profiles.list()?;
            if names.is_empty() {
                println!("No profiles yet. One named 'default' is created on first use.");
            }
            for name in names {
                println!("{name}");
            }
        }
        cli::ProfileCommands::Create { name } => {
            profiles.create(&name)?;
            println!("Created profile '{name}'.");
        }
        cli::ProfileCommands::Delete { name } => {
            profiles.delete(&name)?;
            println!("Deleted profile '{name}' and all of its workouts.");
        }
    }
    Ok(())
}

#[allow(clippy::too_many_lines)]
fn run_command(service: &mut WorkoutService, command: cli::Commands, export_csv: bool) -> Result<()> {
    let units = service.config.units;
    match command {
        cli::Commands::GenerateCompletion { .. } | cli::Commands::Profile { .. } => {
            bail!("Command does not run against a profile");
        }
        // --- Session Commands ---
        cli::Commands::Start {
            template,
            resume,
            date,
        } => {
            let workout = service.start_workout(StartParams {
                template: template.as_deref(),
                resume,
                date,
            })?;
            println!(
                "Workout '{}' in progress (profile '{}').",
                workout.id,
                service.profile()
            );
            if !workout.exercises.is_empty() {
                let exercises = service.list_exercises(None, None)?;
                print_workout(&workout, &exercises, units);
            }
        }
        cli::Commands::Log {
            exercise,
            weight,
            reps,
            rir,
        } => {
            let logged = service.log_sets(LogSetsParams {
                exercise_identifier: &exercise,
                weight: &weight,
                reps: &reps,
                rir,
            })?;
            let reps_list: Vec<String> = logged.sets.iter().map(|s| s.reps.to_string()).collect();
            println!(
                "Logged {} {} x {} for {} ({} set(s) total).",
                format_weight(logged.sets.first().map_or(0.0, |s| s.weight)),
                units,
                reps_list.join(","),
                logged.exercise.name,
                logged.total_sets
            );
        }
        cli::Commands::Note { text, exercise } => {
            service.add_note(&text.join(" "), exercise.as_deref())?;
            match exercise {
                Some(ex) => println!("Added note to '{ex}'."),
                None => println!("Added note to workout."),
            }
        }
        cli::Commands::Add { exercise } => {
            let added = service.add_exercise_to_workout(&exercise)?;
            println!("Added {} to the workout.", added.name);
        }
        cli::Commands::Swap { old, new } => {
            let replacement = service.swap_exercise(&old, &new)?;
            println!("Swapped '{old}' for {}.", replacement.name);
        }
        cli::Commands::Undo { exercise } => {
            let (exercise_id, set) = service.undo_set(exercise.as_deref())?;
            println!(
                "Removed {} x {} from '{exercise_id}'.",
                format_weight(set.weight),
                set.reps
            );
        }
        cli::Commands::Edit {
            exercise,
            set,
            weight,
            reps,
            rir,
        } => {
            if weight.is_none() && reps.is_none() && rir.is_none() {
                bail!("Nothing to edit. Pass --weight, --reps or --rir.");
            }
            let edited = service.edit_set(EditSetParams {
                exercise_identifier: &exercise,
                set_number: set,
                weight: weight.as_deref(),
                reps,
                rir,
            })?;
            println!(
                "Set {set} of '{exercise}' is now {} x {}{}.",
                format_weight(edited.weight),
                edited.reps,
                edited.rir.map_or(String::new(), |r| format!(" @ RIR {r}"))
            );
        }
        cli::Commands::Delete { exercise, set } => {
            service.delete_from_workout(&exercise, set)?;
            match set {
                Some(n) => println!("Deleted set {n} of '{exercise}'."),
                None => println!("Removed '{exercise}' from the workout."),
            }
        }
        cli::Commands::Done => {
            let finished = service.finish_workout()?;
            let exercises = service.list_exercises(None, None)?;
            println!("Workout '{}' saved.", finished.workout.id);
            print_workout(&finished.workout, &exercises, units);
            print_new_records(&finished.records, &exercises);
        }
        cli::Commands::Cancel => {
            let workout = service.cancel_workout()?;
            println!("Discarded workout '{}'.", workout.id);
        }
        cli::Commands::Status => match service.current_workout()? {
            Some(workout) => {
                let exercises = service.list_exercises(None, None)?;
                print_workout(&workout, &exercises, units);
            }
            None => println!("No workout in progress."),
        },

        // --- History Commands ---
        cli::Commands::Last => match service.last_workout()? {
            Some(workout) => {
                let exercises = service.list_exercises(None, None)?;
                print_workout(&workout, &exercises, units);
            }
            None => println!("No finished workouts yet."),
        },
        cli::Commands::Workouts { limit } => {
            let workouts = service.list_workouts(Some(limit))?;
            if export_csv {
                print_workouts_csv(&workouts)?;
            } else if workouts.is_empty() {
                println!("No finished workouts yet.");
            } else {
                print_workouts_table(&workouts, units);
            }
        }
        cli::Commands::History { exercise, limit } => {
            let (definition, progress) = service.exercise_history(&exercise, limit)?;
            if export_csv {
                print_history_csv(&progress)?;
            } else if progress.is_empty() {
                println!("No history for {} yet.", definition.name);
            } else {
                print_history_table(&definition, &progress, units);
            }
        }
        cli::Commands::Pr { exercise } => {
            let records = match exercise {
                Some(identifier) => vec![service.personal_records(&identifier)?],
                None => service.all_personal_records()?,
            };
            let records: Vec<PersonalRecords> =
                records.into_iter().filter(|r| !r.is_empty()).collect();
            if export_csv {
                print_records_csv(&records)?;
            } else if records.is_empty() {
                println!("No personal records yet.");
            } else {
                print_records_table(&records, units);
            }
        }

        // --- Library Commands ---
        cli::Commands::Exercises { command } => run_exercise_command(service, command, export_csv)?,
        cli::Commands::Templates { command } => run_template_command(service, command)?,
        cli::Commands::Config { command } => match command {
            cli::ConfigCommands::Show => {
                println!("Profile:     {}", service.profile());
                println!("Units:       {}", service.config.units);
                println!("Data dir:    {}", service.data_dir().display());
                println!("Config file: {}", service.config_path().display());
            }
            cli::ConfigCommands::Units { units } => {
                service.set_units(units)?;
                println!("Units set to {units} for profile '{}'.", service.profile());
            }
        },
    }

    Ok(())
}

fn run_exercise_command(
    service: &WorkoutService,
    command: cli::ExerciseCommands,
    export_csv: bool,
) -> Result<()> {
    match command {
        cli::ExerciseCommands::List { muscle, type_ } => {
            let exercises = service.list_exercises(muscle, type_)?;
            if export_csv {
                print_exercises_csv(&exercises)?;
            } else if exercises.is_empty() {
                println!("No exercises match the criteria.");
            } else {
                print_exercises_table(&exercises);
            }
        }
        cli::ExerciseCommands::Show { identifier } => {
            let exercise = service.resolve_exercise(&identifier)?;
            print_exercises_table(std::slice::from_ref(&exercise));
            if let Some(notes) = &exercise.notes {
                println!("Notes: {notes}");
            }
        }
        cli::ExerciseCommands::Add {
            id,
            name,
            muscles,
            type_,
            equipment,
            per_side,
            aliases,
            notes,
        } => {
            let exercise = service.create_exercise(Exercise {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
                aliases: aliases
                    .into_iter()
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect(),
                muscles,
                type_,
                equipment,
                weight_input: if per_side {
                    WeightInput::PerSide
                } else {
                    WeightInput::Total
                },
                notes,
            })?;
            println!("Added exercise '{}' ({}).", exercise.id, exercise.name);
        }
        cli::ExerciseCommands::Edit {
            identifier,
            name,
            muscles,
            type_,
            equipment,
            weight_input,
            aliases,
            notes,
        } => {
            let update = ExerciseUpdate {
                name,
                aliases: aliases.map(|s| {
                    s.split(',')
                        .map(|a| a.trim().to_string())
                        .filter(|a| !a.is_empty())
                        .collect()
                }),
                muscles,
                type_,
                equipment,
                weight_input,
                notes: notes.map(|n| Some(n).filter(|n| !n.trim().is_empty())),
            };
            let exercise = service.edit_exercise(&identifier, update)?;
            println!("Updated exercise '{}'.", exercise.id);
        }
        cli::ExerciseCommands::Delete { identifier } => {
            let removed = service.delete_exercise(&identifier)?;
            println!(
                "Deleted exercise '{}'. Past workouts still reference it by id.",
                removed.id
            );
        }
    }
    Ok(())
}

fn run_template_command(service: &WorkoutService, command: cli::TemplateCommands) -> Result<()> {
    match command {
        cli::TemplateCommands::List => {
            let templates = service.list_templates()?;
            if templates.is_empty() {
                println!("No templates defined.");
            } else {
                print_templates_table(&templates);
            }
        }
        cli::TemplateCommands::Show { id } => {
            let template = service.get_template(&id)?;
            print_template(&template);
        }
        cli::TemplateCommands::Create {
            id,
            name,
            exercises,
        } => {
            let template = service.create_template(Template {
                id,
                name,
                exercises,
            })?;
            println!(
                "Created template '{}' with {} exercise(s).",
                template.id,
                template.exercises.len()
            );
        }
        cli::TemplateCommands::Edit {
            id,
            name,
            exercises,
        } => {
            let update = TemplateUpdate {
                name,
                exercises: Some(exercises).filter(|e| !e.is_empty()),
            };
            let template = service.edit_template(&id, update)?;
            println!("Updated template '{}'.", template.id);
        }
        cli::TemplateCommands::Delete { id } => {
            let removed = service.delete_template(&id)?;
            println!("Deleted template '{}'.", removed.id);
        }
    }
    Ok(())
}

// --- Formatting helpers ---

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.0}")
    } else {
        format!("{weight:.1}")
    }
}

fn exercise_name<'a>(exercises: &'a [Exercise], id: &'a str) -> &'a str {
    exercises
        .iter()
        .find(|e| e.id == id)
        .map_or(id, |e| e.name.as_str())
}

fn format_record(record: Option<&RecordSet>, units: Units) -> String {
    record.map_or("-".to_string(), |r| {
        format!(
            "{} {units} x {} ({})",
            format_weight(r.weight),
            r.reps,
            r.date.format("%Y-%m-%d")
        )
    })
}

// --- Table Printing Functions ---

fn print_workout(workout: &Workout, exercises: &[Exercise], units: Units) {
    let header_color = Color::Green;
    println!(
        "\n--- {} ({}) ---",
        workout.id,
        workout.date.format("%Y-%m-%d")
    );
    println!(
        "Started: {}{}",
        workout
            .start_time
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M"),
        workout.end_time.map_or(String::new(), |end| format!(
            "  Finished: {}",
            end.with_timezone(&Local).format("%H:%M")
        ))
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").fg(header_color),
            Cell::new("Set").fg(header_color),
            Cell::new(format!("Weight ({units})")).fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("RIR").fg(header_color),
            Cell::new("Notes").fg(header_color),
        ]);

    for log in &workout.exercises {
        let name = exercise_name(exercises, &log.exercise);
        let notes = log.notes.as_deref().unwrap_or("");
        if log.sets.is_empty() {
            table.add_row(vec![
                Cell::new(name),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(notes),
            ]);
        }
        for (i, set) in log.sets.iter().enumerate() {
            table.add_row(vec![
                Cell::new(if i == 0 { name } else { "" }),
                Cell::new(i + 1),
                Cell::new(format_weight(set.weight)),
                Cell::new(set.reps),
                Cell::new(set.rir.map_or("-".to_string(), |r| r.to_string())),
                Cell::new(if i == 0 { notes } else { "" }),
            ]);
        }
    }
    println!("{table}");

    for note in &workout.notes {
        println!("Note: {note}");
    }
    if let Some(stats) = &workout.stats {
        let muscles: Vec<String> = stats.muscles_worked.iter().map(ToString::to_string).collect();
        println!(
            "Total sets: {}  Volume: {} {units}  Muscles: {}",
            stats.total_sets,
            format_weight(stats.total_volume),
            if muscles.is_empty() {
                "-".to_string()
            } else {
                muscles.join(", ")
            }
        );
    }
}

fn print_new_records(records: &[NewRecord], exercises: &[Exercise]) {
    if records.is_empty() {
        return;
    }
    println!("*********************************");
    println!("*        Personal Best!         *");
    for record in records {
        let previous = record.previous.map_or("-".to_string(), |p| format_weight(p.value));
        println!(
            "* {}: {} {} (Previous: {previous})",
            exercise_name(exercises, &record.exercise),
            record.kind,
            format_weight(record.new.value),
        );
    }
    println!("*********************************");
}

fn print_workouts_table(workouts: &[Workout], units: Units) {
    let header_color = Color::Cyan;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").fg(header_color),
            Cell::new("Id").fg(header_color),
            Cell::new("Template").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new(format!("Volume ({units})")).fg(header_color),
        ]);

    for workout in workouts {
        table.add_row(vec![
            Cell::new(workout.date.format("%Y-%m-%d")),
            Cell::new(&workout.id),
            Cell::new(workout.template.as_deref().unwrap_or("-")),
            Cell::new(workout.exercises.len()),
            Cell::new(workout.total_sets()),
            Cell::new(
                workout
                    .stats
                    .as_ref()
                    .map_or("-".to_string(), |s| format_weight(s.total_volume)),
            ),
        ]);
    }
    println!("{table}");
}

fn print_exercises_table(exercises: &[Exercise]) {
    let header_color = Color::Cyan;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Type").fg(header_color),
            Cell::new("Equipment").fg(header_color),
            Cell::new("Muscles").fg(header_color),
            Cell::new("Aliases").fg(header_color),
            Cell::new("Weight").fg(header_color),
        ]);

    for exercise in exercises {
        let muscles: Vec<String> = exercise.muscles.iter().map(ToString::to_string).collect();
        table.add_row(vec![
            Cell::new(&exercise.id),
            Cell::new(&exercise.name),
            Cell::new(exercise.type_),
            Cell::new(exercise.equipment),
            Cell::new(muscles.join(", ")),
            Cell::new(if exercise.aliases.is_empty() {
                "-".to_string()
            } else {
                exercise.aliases.join(", ")
            }),
            Cell::new(exercise.weight_input),
        ]);
    }
    println!("{table}");
}

fn print_templates_table(templates: &[Template]) {
    let header_color = Color::Magenta;
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Exercises").fg(header_color),
        ]);

    for template in templates {
        let entries: Vec<&str> = template
            .exercises
            .iter()
            .map(|e| e.exercise.as_str())
            .collect();
        table.add_row(vec![
            Cell::new(&template.id),
            Cell::new(&template.name),
            Cell::new(entries.join(", ")),
        ]);
    }
    println!("{table}");
}

fn print_template(template: &Template) {
    println!("\n--- {} ({}) ---", template.name, template.id);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Exercise", "Sets", "Reps"]);
    for (i, entry) in template.exercises.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&entry.exercise),
            Cell::new(entry.sets),
            Cell::new(&entry.reps),
        ]);
    }
    println!("{table}");
}

fn print_history_table(exercise: &Exercise, progress: &[ExerciseProgress], units: Units) {
    let header_color = Color::Yellow;
    println!("\n--- History for '{}' ---", exercise.name);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new(format!("Top Set ({units})")).fg(header_color),
            Cell::new("Est. 1RM").fg(header_color),
            Cell::new("Volume").fg(header_color),
        ]);

    for row in progress {
        table.add_row(vec![
            Cell::new(row.date.format("%Y-%m-%d")),
            Cell::new(row.sets),
            Cell::new(row.top_set.map_or("-".to_string(), |s| {
                format!("{} x {}", format_weight(s.weight), s.reps)
            })),
            Cell::new(row.best_e1rm.map_or("-".to_string(), format_weight)),
            Cell::new(format_weight(row.volume)),
        ]);
    }
    println!("{table}");
}

fn print_records_table(records: &[PersonalRecords], units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Exercise").add_attribute(Attribute::Bold),
            Cell::new("Heaviest").add_attribute(Attribute::Bold),
            Cell::new("Est. 1RM").add_attribute(Attribute::Bold),
            Cell::new("Most Reps").add_attribute(Attribute::Bold),
            Cell::new("Best Set Volume").add_attribute(Attribute::Bold),
        ]);

    for record in records {
        table.add_row(vec![
            Cell::new(&record.exercise),
            Cell::new(format_record(record.heaviest.as_ref(), units)),
            Cell::new(
                record
                    .best_e1rm
                    .map_or("-".to_string(), |r| format_weight(r.value)),
            ),
            Cell::new(format_record(record.most_reps.as_ref(), units)),
            Cell::new(
                record
                    .best_set_volume
                    .map_or("-".to_string(), |r| format_weight(r.value)),
            ),
        ]);
    }
    println!("{table}");
}

// --- CSV Printing Functions ---

fn print_workouts_csv(workouts: &[Workout]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Date", "Id", "Template", "Exercise", "Set", "Weight", "Reps", "RIR"])?;
    for workout in workouts {
        for log in &workout.exercises {
            for (i, set) in log.sets.iter().enumerate() {
                writer.write_record([
                    workout.date.format("%Y-%m-%d").to_string(),
                    workout.id.clone(),
                    workout.template.clone().unwrap_or_default(),
                    log.exercise.clone(),
                    (i + 1).to_string(),
                    set.weight.to_string(),
                    set.reps.to_string(),
                    set.rir.map_or(String::new(), |r| r.to_string()),
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

fn print_exercises_csv(exercises: &[Exercise]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Id", "Name", "Type", "Equipment", "Muscles", "Aliases", "Weight_Input"])?;
    for exercise in exercises {
        let muscles: Vec<String> = exercise.muscles.iter().map(ToString::to_string).collect();
        writer.write_record([
            exercise.id.clone(),
            exercise.name.clone(),
            exercise.type_.to_string(),
            exercise.equipment.to_string(),
            muscles.join(";"),
            exercise.aliases.join(";"),
            exercise.weight_input.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_history_csv(progress: &[ExerciseProgress]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Date", "Sets", "Top_Weight", "Top_Reps", "Est_1RM", "Volume"])?;
    for row in progress {
        writer.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.sets.to_string(),
            row.top_set.map_or(String::new(), |s| s.weight.to_string()),
            row.top_set.map_or(String::new(), |s| s.reps.to_string()),
            row.best_e1rm.map_or(String::new(), |v| format!("{v:.2}")),
            format!("{:.2}", row.volume),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_records_csv(records: &[PersonalRecords]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Exercise", "Record", "Value", "Weight", "Reps", "Date"])?;
    for record in records {
        let rows = [
            ("Heaviest", record.heaviest),
            ("Est_1RM", record.best_e1rm),
            ("Most_Reps", record.most_reps),
            ("Best_Set_Volume", record.best_set_volume),
        ];
        for (label, value) in rows {
            if let Some(r) = value {
                writer.write_record([
                    record.exercise.clone(),
                    label.to_string(),
                    format!("{:.2}", r.value),
                    r.weight.to_string(),
                    r.reps.to_string(),
                    r.date.format("%Y-%m-%d").to_string(),
                ])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
