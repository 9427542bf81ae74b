use bc_protocol::*;
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

#[test]
fn test_recipe_file_deserialization_from_yaml() {
    let yaml_str = r#"
name: Batch A
version: "2.1"
description: Standard fill
ingredients:
  - name: Water
    quantity: 120
    unit: L
  - name: Sugar
    quantity: 8.5
    unit: kg
steps:
  - name: Charge
  - name: Mix
    duration_minutes: 15
    parameters:
      agitator_rpm: 60
quality_parameters:
  brix: 11.5
"#;

    let recipe: RecipeFile = serde_yaml::from_str(yaml_str).expect("Failed to deserialize RecipeFile");

    assert_eq!(recipe.name, "Batch A");
    assert_eq!(recipe.version, "2.1");
    assert_eq!(recipe.content.ingredients.len(), 2);
    assert_eq!(recipe.content.ingredients[1].unit, "kg");
    assert_eq!(recipe.content.steps.len(), 2);
    assert_eq!(recipe.content.steps[1].duration_minutes, Some(15.0));
    assert_eq!(
        recipe.content.steps[1].parameters.get("agitator_rpm"),
        Some(&serde_json::json!(60))
    );
    assert!(recipe.content.safety_parameters.is_empty());
}

#[test]
fn test_recipe_file_default_version() {
    let yaml_str = r#"
name: Batch B
ingredients: []
steps: []
"#;

    let recipe: RecipeFile = serde_yaml::from_str(yaml_str).expect("Failed to deserialize RecipeFile");
    assert_eq!(recipe.version, DEFAULT_RECIPE_VERSION);
}

#[test]
fn test_recipe_content_accepts_bare_names() {
    let json = serde_json::json!({
        "ingredients": ["Water", "Sugar"],
        "steps": ["Charge", "Mix"]
    });

    let content: RecipeContent = serde_json::from_value(json).expect("Failed to deserialize RecipeContent");
    let ingredients: Vec<&str> = content.ingredients.iter().map(|i| i.name.as_str()).collect();
    let steps: Vec<&str> = content.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(ingredients, vec!["Water", "Sugar"]);
    assert_eq!(content.ingredients[0].quantity, 0.0);
    assert_eq!(steps, vec!["Charge", "Mix"]);
    assert_eq!(content.steps[0].duration_minutes, None);
}

#[test]
fn test_recipe_content_lenient_numbers_and_step_names() {
    let json = serde_json::json!({
        "ingredients": [
            {"name": "Water", "quantity": "10", "unit": "L"},
            {"name": "Salt", "quantity": "a pinch"}
        ],
        "steps": [
            {"step": "Mix", "duration_minutes": " 7.5 "},
            {"description": "Rest"},
            {"name": "Drain", "duration_minutes": null}
        ]
    });

    let content: RecipeContent = serde_json::from_value(json).expect("Failed to deserialize RecipeContent");
    assert_eq!(content.ingredients[0].quantity, 10.0);
    assert_eq!(content.ingredients[1].quantity, 0.0, "unparseable text counts as no quantity");
    assert_eq!(content.steps[0].name, "Mix");
    assert_eq!(content.steps[0].duration_minutes, Some(7.5));
    assert_eq!(content.steps[1].name, "step_2");
    assert_eq!(content.steps[1].description, "Rest");
    assert_eq!(content.steps[2].duration_minutes, None);
}

#[test]
fn test_recipe_content_rejects_non_list_sections() {
    let json = serde_json::json!({"ingredients": "water", "steps": []});
    let result: Result<RecipeContent, _> = serde_json::from_value(json);
    assert!(result.is_err());
}

#[test]
fn test_recipe_file_requires_steps() {
    let yaml_str = r#"
name: Batch C
ingredients: []
"#;

    let result: Result<RecipeFile, _> = serde_yaml::from_str(yaml_str);
    assert!(result.is_err(), "steps section must be present");
}

#[test]
fn test_chart_status_serialization() {
    let json = serde_json::to_value(ChartStatus::Stopping).expect("Failed to serialize ChartStatus");
    assert_eq!(json, "STOPPING");

    let deserialized: ChartStatus = serde_json::from_value(json).expect("Failed to deserialize ChartStatus");
    assert_eq!(deserialized, ChartStatus::Stopping);
}

#[test]
fn test_execution_status_serialization() {
    let json = serde_json::to_value(ExecutionStatus::Aborted).expect("Failed to serialize ExecutionStatus");
    assert_eq!(json, "aborted");
    assert_eq!(ExecutionStatus::Aborted.to_string(), "aborted");
}

#[test]
fn test_execution_status_transitions() {
    assert!(ExecutionStatus::Running.can_transition_to(ExecutionStatus::Aborted));
    assert!(ExecutionStatus::Running.can_transition_to(ExecutionStatus::Completed));
    assert!(!ExecutionStatus::Running.can_transition_to(ExecutionStatus::Running));
    assert!(!ExecutionStatus::Aborted.can_transition_to(ExecutionStatus::Running));
    assert!(!ExecutionStatus::Completed.can_transition_to(ExecutionStatus::Failed));
}

#[test]
fn test_chart_record_serialization() {
    let mut variables = HashMap::new();
    variables.insert("setpoint".to_string(), serde_json::json!(42.0));
    let record = ChartExecutionRecord::new("Line1/Fill".to_string(), variables, Utc::now());

    let json = serde_json::to_string(&record).expect("Failed to serialize ChartExecutionRecord");
    let deserialized: ChartExecutionRecord =
        serde_json::from_str(&json).expect("Failed to deserialize ChartExecutionRecord");

    assert_eq!(deserialized, record);
    assert_eq!(deserialized.current_step, INITIAL_STEP);
    assert_eq!(deserialized.status, ChartStatus::Running);
}

#[test]
fn test_status_view_untagged_serialization() {
    let summary = ExecutionStatusView::Summary {
        execution_id: Uuid::new_v4(),
        status: ExecutionStatus::Running,
        progress_percent: 12.5,
        current_step: "Charge".to_string(),
    };

    let json = serde_json::to_value(&summary).expect("Failed to serialize summary view");
    assert_eq!(json["status"], "running");
    assert!(json.get("recipe_id").is_none());

    let deserialized: ExecutionStatusView =
        serde_json::from_value(json).expect("Failed to deserialize summary view");
    assert!(matches!(deserialized, ExecutionStatusView::Summary { .. }));
    assert_eq!(deserialized.current_step(), "Charge");
}

#[test]
fn test_event_enum_serialization() {
    let event = Event::ChartStarted {
        chart_path: "Line1/Fill".to_string(),
        execution_id: Uuid::new_v4(),
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(json["type"], "chartStarted");
    assert!(json["payload"].is_object());

    let status_update = Event::ChartStatusUpdate {
        chart_path: "Line1/Fill".to_string(),
        execution_id: Uuid::new_v4(),
        status: ChartStatus::Paused,
    };
    let json = serde_json::to_value(&status_update).expect("Failed to serialize Event");
    assert_eq!(json["type"], "chartStatusUpdate");
    assert_eq!(json["payload"]["status"], "PAUSED");
}

#[test]
fn test_control_settings_defaults() {
    let settings: ControlSettings = serde_json::from_str("{}").expect("Failed to deserialize settings");
    assert_eq!(settings, ControlSettings::default());
    assert_eq!(settings.history_limit, 50);
    assert_eq!(settings.default_abort_reason, "User requested");
}

#[test]
fn test_nominal_duration() {
    let now = Utc::now();
    let mut recipe = RecipeDefinition {
        recipe_id: "batch_a_1_0_0000".to_string(),
        name: "Batch A".to_string(),
        version: "1.0".to_string(),
        description: String::new(),
        created_date: now,
        modified_date: now,
        content: RecipeContent {
            ingredients: Vec::new(),
            steps: vec![
                RecipeStep {
                    name: "Charge".to_string(),
                    description: String::new(),
                    duration_minutes: Some(5.0),
                    parameters: HashMap::new(),
                },
                RecipeStep {
                    name: "Mix".to_string(),
                    description: String::new(),
                    duration_minutes: Some(10.0),
                    parameters: HashMap::new(),
                },
            ],
            quality_parameters: HashMap::new(),
            equipment_requirements: HashMap::new(),
            safety_parameters: HashMap::new(),
        },
    };

    assert_eq!(recipe.first_step(), Some("Charge"));
    assert_eq!(recipe.nominal_duration_minutes(), Some(15.0));

    recipe.content.steps[1].duration_minutes = None;
    assert_eq!(recipe.nominal_duration_minutes(), None);
}
