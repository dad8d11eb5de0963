//! Output file names.
//!
//! Datasets carrying CMIP-style `driving_*` global attributes get a
//! descriptive name:
//! `{variable}_{model}_{experiment}_r{r}i{i}p{p}_{start}-{end}.nc`.

use netcdf_io::{AttrValue, Attributes, Dataset, TimeUnits};

/// Name used when the inputs carry no CMIP attributes.
pub const DEFAULT_OUTPUT_NAME: &str = "out.nc";

/// File name for `output`, computed from `input_attrs`.
pub fn output_filename(output: &Dataset, input_attrs: &Attributes) -> String {
    cmip_filename(output, input_attrs).unwrap_or_else(|| DEFAULT_OUTPUT_NAME.to_string())
}

/// Insert `-<index>` before the extension.
pub fn indexed_filename(name: &str, index: usize) -> String {
    match name.strip_suffix(".nc") {
        Some(stem) => format!("{}-{}.nc", stem, index),
        None => format!("{}-{}", name, index),
    }
}

fn cmip_filename(output: &Dataset, attrs: &Attributes) -> Option<String> {
    let variable = output.data_vars.keys().next()?;
    let model = attr_string(attrs, "driving_model_id")?;
    let experiment = attr_string(attrs, "driving_experiment_id")?;
    let realization = attr_string(attrs, "driving_realization")?;
    let initialization = attr_string(attrs, "driving_initialization_method")?;
    let physics = attr_string(attrs, "driving_physics_version")?;

    let time = output.coords.get("time")?;
    let units = TimeUnits::from_attrs(&time.attrs).ok()?;
    let start = units.decode(*time.values.first()?).ok()?;
    let end = units.decode(*time.values.last()?).ok()?;

    Some(format!(
        "{}_{}_{}_r{}i{}p{}_{}-{}.nc",
        file_component(&variable.replace('_', "-")),
        file_component(&model),
        file_component(&experiment.replace(',', "+")),
        file_component(&realization),
        file_component(&initialization),
        file_component(&physics),
        start.compact(),
        end.compact()
    ))
}

/// Attribute text made safe for a single path component: characters
/// outside `[A-Za-z0-9+._-]` become `-` and a component of only dots
/// becomes `x`.
fn file_component(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '+' | '.' | '_' | '-' => c,
            _ => '-',
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "x".to_string()
    } else {
        cleaned
    }
}

/// Attribute rendered as text; whole numbers lose their decimal point.
fn attr_string(attrs: &Attributes, name: &str) -> Option<String> {
    match attrs.get(name)? {
        AttrValue::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        AttrValue::Integer(i) => Some(i.to_string()),
        AttrValue::Number(v) if v.fract() == 0.0 => Some((*v as i64).to_string()),
        AttrValue::Number(v) => Some(v.to_string()),
        _ => None,
    }
}
