//! CLI presentation: text and json formatters for generator schemas.

use crate::engine::Target;
use crate::error::CliError;
use crate::resolver::UnknownInputPolicy;
use crate::schema::{
    ArraySizeSource, GeneratorParamKind, GeneratorSchema, OutputShape, OutputType,
};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_list_text(schemas: &[&GeneratorSchema]) -> String {
    if schemas.is_empty() {
        return "No generators registered.".to_string();
    }
    let mut out = format!("{}\n\n", format_section_heading("Generators"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Generator", "Inputs", "GeneratorParams", "Outputs"]);
    for schema in schemas {
        table.add_row(vec![
            schema.id.clone(),
            schema.inputs.len().to_string(),
            schema.generator_params.len().to_string(),
            schema.outputs.len().to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\nTotal: {} generator(s)", table, schemas.len()));
    out
}

pub fn format_list_json(schemas: &[&GeneratorSchema]) -> Result<String, CliError> {
    let ids: Vec<&str> = schemas.iter().map(|s| s.id.as_str()).collect();
    let out = json!({ "generators": ids, "total": ids.len() });
    Ok(serde_json::to_string_pretty(&out)?)
}

fn output_type_label(ty: &OutputType) -> String {
    match ty {
        OutputType::Fixed(t) => t.to_string(),
        OutputType::FromParam(name) => format!("<{}>", name),
        OutputType::Any => "*".to_string(),
    }
}

fn output_shape_label(shape: &OutputShape) -> String {
    match shape {
        OutputShape::Single => "Func".to_string(),
        OutputShape::Tuple(n) => format!("Tuple({})", n),
        OutputShape::Array(ArraySizeSource::Input(name)) => format!("Func[len({})]", name),
        OutputShape::Array(ArraySizeSource::GeneratorParam(name)) => format!("Func[{}]", name),
    }
}

fn param_detail(kind: &GeneratorParamKind) -> String {
    match kind {
        GeneratorParamKind::Int {
            min: Some(min),
            max: Some(max),
            ..
        } => format!("[{}, {}]", min, max),
        GeneratorParamKind::Enum { choices, .. } => choices.join(" | "),
        _ => String::new(),
    }
}

pub fn format_describe_text(schema: &GeneratorSchema) -> String {
    let mut out = format!("{}\n\n", format_section_heading(&format!("Generator: {}", schema.id)));

    out.push_str(&format!("{}\n\n", format_section_heading("Inputs")));
    if schema.inputs.is_empty() {
        out.push_str("No inputs.\n\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["#", "Name", "Kind", "Required", "Default", "Range"]);
        for (i, input) in schema.inputs.iter().enumerate() {
            table.add_row(vec![
                i.to_string(),
                input.name.clone(),
                input.kind.describe(),
                if input.required { "yes" } else { "no" }.to_string(),
                input.default.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                input
                    .range
                    .map(|(min, max)| format!("[{}, {}]", min, max))
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    out.push_str(&format!("{}\n\n", format_section_heading("GeneratorParams")));
    if schema.generator_params.is_empty() {
        out.push_str("No GeneratorParams.\n\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Name", "Type", "Default", "Allowed"]);
        for param in &schema.generator_params {
            table.add_row(vec![
                param.name.clone(),
                param.kind.type_name().to_string(),
                param.kind.default_display(),
                param_detail(&param.kind),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    out.push_str(&format!("{}\n\n", format_section_heading("Outputs")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Name", "Shape", "Types", "Dimensions"]);
    for (i, output) in schema.outputs.iter().enumerate() {
        let types: Vec<String> = output.types.iter().map(output_type_label).collect();
        table.add_row(vec![
            i.to_string(),
            output.name.clone(),
            output_shape_label(&output.shape),
            types.join(", "),
            output.dimensions.to_string(),
        ]);
    }
    out.push_str(&format!("{}", table));
    out
}

/// Settings `generate` will run with for this generator.
pub fn format_binding_settings(policy: UnknownInputPolicy, target: &Target) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Binding"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["Unknown inputs".to_string(), policy.to_string()]);
    table.add_row(vec!["Target".to_string(), target.to_string()]);
    out.push_str(&format!("{}", table));
    out
}

pub fn format_describe_json(schema: &GeneratorSchema) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(schema)?)
}
