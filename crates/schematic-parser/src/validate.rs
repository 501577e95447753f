//! Schema validation of raw diagram descriptions.
//!
//! The validator walks the untyped JSON value so it can explain every
//! structural problem, not only the first one a typed deserializer would
//! stumble over. It runs before any typed conversion, flattening, or layout.
//!
//! ## Validations Performed
//!
//! 1. **Root shape**: a flat component array, or an object carrying
//!    `entryPointModule` and `moduleDefinitions`. Any other root stops
//!    validation immediately.
//! 2. **Entry point**: a non-empty name of an existing module definition.
//! 3. **Module definitions**: port declarations, `components` array, and
//!    `outputMappings` targets.
//! 4. **Components**: ids are checked eagerly per scope (present, unique),
//!    then every module instance and primitive connection is resolved
//!    against its scope.
//!
//! Checks that depend on an earlier failed check are skipped rather than
//! reported again.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{Map, Value};

use schematic_core::{
    model::MODULE_TYPE_TAG,
    reference::{MODULE_INPUT_PREFIX, Reference},
};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError};

const ENTRY_POINT_KEY: &str = "entryPointModule";
const DEFINITIONS_KEY: &str = "moduleDefinitions";
const INPUTS_KEY: &str = "inputs";
const OUTPUTS_KEY: &str = "outputs";
const COMPONENTS_KEY: &str = "components";
const OUTPUT_MAPPINGS_KEY: &str = "outputMappings";

/// Outcome of validating one diagram description.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub(crate) fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Returns `true` when no error was reported. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|diag| diag.severity().is_error())
    }

    /// All diagnostics, in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity().is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity().is_warning())
    }

    /// Renders every diagnostic as a single-line message.
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    /// Converts the report into a result.
    ///
    /// Returns the warnings when the description is valid, and every
    /// diagnostic wrapped in a [`ParseError`] otherwise.
    pub fn into_result(self) -> Result<Vec<Diagnostic>, ParseError> {
        if self.is_valid() {
            Ok(self.diagnostics)
        } else {
            Err(ParseError::new(self.diagnostics))
        }
    }
}

impl From<Diagnostic> for ValidationReport {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

/// Validates a diagram description given as a JSON value.
///
/// Never panics on malformed input; every problem becomes a diagnostic.
///
/// # Example
///
/// ```
/// # use schematic_parser::validate;
/// let value = serde_json::json!([
///     {"id": "x0", "type": "input"},
///     {"id": "r", "type": "relu2", "inputs": {"a": "x1.out"}}
/// ]);
///
/// let report = validate(&value);
/// assert!(!report.is_valid());
/// assert_eq!(
///     report.messages(),
///     ["error[E307]: undefined component `x1` (at [1].inputs.a)"]
/// );
/// ```
pub fn validate(value: &Value) -> ValidationReport {
    let report = SchemaValidator::default().validate(value);
    debug!(
        valid = report.is_valid(),
        diagnostics = report.diagnostics().len();
        "Schema validation finished"
    );
    report
}

/// Port declarations of a module definition, read without reporting.
///
/// A list is `None` when its declaration is malformed; checks that need it
/// are then skipped, since the malformed declaration is reported on its own.
#[derive(Debug, Default)]
struct Signature<'a> {
    inputs: Option<Vec<(&'a str, usize)>>,
    outputs: Option<Vec<&'a str>>,
}

impl<'a> Signature<'a> {
    fn read(definition: &'a Value) -> Self {
        let inputs = definition
            .get(INPUTS_KEY)
            .and_then(Value::as_array)
            .and_then(|specs| specs.iter().map(|spec| parse_input_spec(spec).ok()).collect());
        let outputs = definition
            .get(OUTPUTS_KEY)
            .and_then(Value::as_array)
            .and_then(|names| {
                names
                    .iter()
                    .map(|name| name.as_str().filter(|name| !name.is_empty()))
                    .collect()
            });
        Self { inputs, outputs }
    }
}

#[derive(Debug)]
enum InputSpecError {
    Shape,
    Name,
    Size,
}

fn parse_input_spec(spec: &Value) -> Result<(&str, usize), InputSpecError> {
    match spec {
        Value::String(name) if !name.is_empty() => Ok((name.as_str(), 1)),
        Value::String(_) => Err(InputSpecError::Name),
        Value::Object(fields) => {
            let name = fields
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .ok_or(InputSpecError::Name)?;
            let size = match fields.get("size") {
                None => 1,
                Some(size) => size
                    .as_u64()
                    .filter(|size| *size >= 1)
                    .and_then(|size| usize::try_from(size).ok())
                    .ok_or(InputSpecError::Size)?,
            };
            Ok((name, size))
        }
        _ => Err(InputSpecError::Shape),
    }
}

/// A component id visible in a scope.
#[derive(Debug, Clone, Copy)]
struct Sibling<'a> {
    index: usize,
    module_type: Option<&'a str>,
}

type Siblings<'a> = HashMap<&'a str, Sibling<'a>>;

/// What `$.` references may resolve to in a scope.
#[derive(Debug, Clone, Copy)]
enum ScopeInputs<'s, 'a> {
    /// The root of a flat diagram: there is no enclosing module.
    Root,
    /// The declared inputs of the enclosing module definition.
    Declared(&'s [(&'a str, usize)]),
    /// The enclosing declaration is malformed and already reported.
    Unknown,
}

#[derive(Debug, Clone, Copy)]
struct Scope<'s, 'a> {
    inputs: ScopeInputs<'s, 'a>,
    siblings: &'s Siblings<'a>,
}

#[derive(Default)]
struct SchemaValidator<'a> {
    diagnostics: DiagnosticCollector,
    hierarchical: bool,
    signatures: IndexMap<&'a str, Signature<'a>>,
}

impl<'a> SchemaValidator<'a> {
    fn validate(mut self, value: &'a Value) -> ValidationReport {
        match value {
            Value::Array(components) => {
                trace!(components = components.len(); "Validating flat diagram");
                let siblings = self.check_component_ids(components, "");
                let scope = Scope {
                    inputs: ScopeInputs::Root,
                    siblings: &siblings,
                };
                self.check_components(components, "", scope);
            }
            Value::Object(root) => self.validate_hierarchical(root),
            other => self.diagnostics.emit(
                Diagnostic::error(format!(
                    "diagram must be an array of components or an object with \
                     `{ENTRY_POINT_KEY}` and `{DEFINITIONS_KEY}`, found {}",
                    json_kind(other)
                ))
                .with_code(ErrorCode::E100),
            ),
        }

        if self.diagnostics.has_errors() {
            debug!("Schema validation found errors");
        }
        ValidationReport::new(self.diagnostics.into_diagnostics())
    }

    fn validate_hierarchical(&mut self, root: &'a Map<String, Value>) {
        let mut missing_key = false;
        for key in [ENTRY_POINT_KEY, DEFINITIONS_KEY] {
            if !root.contains_key(key) {
                self.diagnostics.emit(
                    Diagnostic::error(format!("missing required key `{key}`"))
                        .with_code(ErrorCode::E101)
                        .with_help(format!(
                            "a hierarchical diagram needs both `{ENTRY_POINT_KEY}` and \
                             `{DEFINITIONS_KEY}`; a flat diagram is a plain array"
                        )),
                );
                missing_key = true;
            }
        }
        if missing_key {
            return;
        }

        let definitions = match &root[DEFINITIONS_KEY] {
            Value::Object(definitions) => definitions,
            other => {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "`{DEFINITIONS_KEY}` must be an object mapping type names to module \
                         definitions, found {}",
                        json_kind(other)
                    ))
                    .with_code(ErrorCode::E200)
                    .with_path(DEFINITIONS_KEY),
                );
                return;
            }
        };

        trace!(definitions = definitions.len(); "Validating hierarchical diagram");
        self.hierarchical = true;
        self.signatures = definitions
            .iter()
            .map(|(name, definition)| (name.as_str(), Signature::read(definition)))
            .collect();

        self.check_entry_point(&root[ENTRY_POINT_KEY]);

        for (name, definition) in definitions {
            self.check_definition(name, definition);
        }
    }

    fn check_entry_point(&mut self, entry_point: &Value) {
        match entry_point.as_str() {
            Some(name) if !name.is_empty() => {
                if !self.signatures.contains_key(name) {
                    let help = self.defined_types_help();
                    self.diagnostics.emit(
                        Diagnostic::error(format!("entry point module `{name}` is not defined"))
                            .with_code(ErrorCode::E103)
                            .with_path(ENTRY_POINT_KEY)
                            .with_help(help),
                    );
                }
            }
            _ => self.diagnostics.emit(
                Diagnostic::error(format!(
                    "`{ENTRY_POINT_KEY}` must be a non-empty string, found {}",
                    json_kind(entry_point)
                ))
                .with_code(ErrorCode::E102)
                .with_path(ENTRY_POINT_KEY),
            ),
        }
    }

    fn check_definition(&mut self, name: &'a str, definition: &'a Value) {
        let path = format!("{DEFINITIONS_KEY}.{name}");
        let Value::Object(fields) = definition else {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "module definition `{name}` must be an object, found {}",
                    json_kind(definition)
                ))
                .with_code(ErrorCode::E200)
                .with_path(path),
            );
            return;
        };

        self.check_input_specs(fields, &path);
        self.check_output_names(fields, &path);

        let components_path = format!("{path}.{COMPONENTS_KEY}");
        let components = match self.required_array(fields, COMPONENTS_KEY, &path) {
            Some(components) => components,
            None => {
                // Output mappings cannot be resolved without components.
                self.required_object(fields, OUTPUT_MAPPINGS_KEY, &path);
                return;
            }
        };

        let siblings = self.check_component_ids(components, &components_path);
        self.check_output_mappings(name, fields, &path, &siblings);

        let inputs = match self.signatures[name].inputs.clone() {
            Some(inputs) => inputs,
            None => {
                let scope = Scope {
                    inputs: ScopeInputs::Unknown,
                    siblings: &siblings,
                };
                self.check_components(components, &components_path, scope);
                return;
            }
        };
        let scope = Scope {
            inputs: ScopeInputs::Declared(&inputs),
            siblings: &siblings,
        };
        self.check_components(components, &components_path, scope);
    }

    fn check_input_specs(&mut self, fields: &'a Map<String, Value>, path: &str) {
        let Some(specs) = self.required_array(fields, INPUTS_KEY, path) else {
            return;
        };

        let mut seen = HashSet::new();
        for (index, spec) in specs.iter().enumerate() {
            let spec_path = format!("{path}.{INPUTS_KEY}[{index}]");
            match parse_input_spec(spec) {
                Ok((name, _)) => {
                    if !seen.insert(name) {
                        self.diagnostics.emit(
                            Diagnostic::error(format!("input `{name}` is declared more than once"))
                                .with_code(ErrorCode::E204)
                                .with_path(spec_path),
                        );
                    }
                }
                Err(InputSpecError::Size) => self.diagnostics.emit(
                    Diagnostic::error("input `size` must be a positive integer")
                        .with_code(ErrorCode::E202)
                        .with_path(format!("{spec_path}.size")),
                ),
                Err(InputSpecError::Name | InputSpecError::Shape) => self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "input must be a non-empty name or an object with a non-empty `name`, \
                         found {}",
                        json_kind(spec)
                    ))
                    .with_code(ErrorCode::E201)
                    .with_path(spec_path)
                    .with_help(r#"write `"x"` for a scalar input or `{"name": "w", "size": 4}` for a bus"#),
                ),
            }
        }
    }

    fn check_output_names(&mut self, fields: &'a Map<String, Value>, path: &str) {
        let Some(outputs) = self.required_array(fields, OUTPUTS_KEY, path) else {
            return;
        };

        let mut seen = HashSet::new();
        for (index, output) in outputs.iter().enumerate() {
            let output_path = format!("{path}.{OUTPUTS_KEY}[{index}]");
            match output.as_str().filter(|name| !name.is_empty()) {
                Some(name) => {
                    if !seen.insert(name) {
                        self.diagnostics.emit(
                            Diagnostic::error(format!("output `{name}` is declared more than once"))
                                .with_code(ErrorCode::E204)
                                .with_path(output_path),
                        );
                    }
                }
                None => self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "output name must be a non-empty string, found {}",
                        json_kind(output)
                    ))
                    .with_code(ErrorCode::E203)
                    .with_path(output_path),
                ),
            }
        }
    }

    fn check_output_mappings(
        &mut self,
        name: &'a str,
        fields: &'a Map<String, Value>,
        path: &str,
        siblings: &Siblings<'a>,
    ) {
        let Some(mappings) = self.required_object(fields, OUTPUT_MAPPINGS_KEY, path) else {
            return;
        };
        let outputs = self.signatures[name].outputs.clone();
        let outputs = outputs.as_deref();

        for (output, target) in mappings {
            let mapping_path = format!("{path}.{OUTPUT_MAPPINGS_KEY}.{output}");

            let undeclared = outputs.is_some_and(|outputs| !outputs.contains(&output.as_str()));
            if undeclared {
                let outputs = outputs.unwrap_or_default();
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "output mapping `{output}` does not correspond to a declared output"
                    ))
                    .with_code(ErrorCode::E205)
                    .with_path(mapping_path.clone())
                    .with_help(list_help("declared outputs", outputs.iter().copied())),
                );
            }

            let Some(raw) = target.as_str() else {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "output mapping `{output}` must be a `component.port` string, found {}",
                        json_kind(target)
                    ))
                    .with_code(ErrorCode::E206)
                    .with_path(mapping_path),
                );
                continue;
            };

            match raw.parse::<Reference>() {
                Err(err) => self.diagnostics.emit(
                    Diagnostic::error(err.to_string())
                        .with_code(ErrorCode::E303)
                        .with_path(mapping_path),
                ),
                Ok(Reference::ModuleInput { .. }) => self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "output mapping `{output}` must reference an internal component, \
                         not the module input `{raw}`"
                    ))
                    .with_code(ErrorCode::E206)
                    .with_path(mapping_path),
                ),
                Ok(Reference::Component { source, port }) => match siblings.get(source.as_str()) {
                    None => self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "output mapping `{output}` references unknown component `{source}`"
                        ))
                        .with_code(ErrorCode::E206)
                        .with_path(mapping_path),
                    ),
                    Some(sibling) => self.check_instance_output(sibling, &source, &port, &mapping_path),
                },
            }
        }

        if let Some(outputs) = outputs {
            for output in outputs {
                if !mappings.contains_key(*output) {
                    self.diagnostics.emit(
                        Diagnostic::error(format!("output `{output}` is never mapped"))
                            .with_code(ErrorCode::E210)
                            .with_path(format!("{path}.{OUTPUT_MAPPINGS_KEY}"))
                            .with_help(format!(
                                "map it to an internal port, e.g. `\"{output}\": \"component.out\"`"
                            )),
                    );
                }
            }
        }
    }

    /// Checks ids of every component in one scope before any reference is
    /// resolved against them.
    fn check_component_ids(&mut self, components: &'a [Value], base: &str) -> Siblings<'a> {
        let mut siblings = Siblings::new();

        for (index, component) in components.iter().enumerate() {
            let path = format!("{base}[{index}]");
            let Value::Object(fields) = component else {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "component must be an object, found {}",
                        json_kind(component)
                    ))
                    .with_code(ErrorCode::E200)
                    .with_path(path),
                );
                continue;
            };

            let Some(id) = fields
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
            else {
                self.diagnostics.emit(
                    Diagnostic::error("component must have a non-empty string `id`")
                        .with_code(ErrorCode::E207)
                        .with_path(path),
                );
                continue;
            };

            if id.contains('.') {
                self.diagnostics.emit(
                    Diagnostic::error(format!("component id `{id}` must not contain `.`"))
                        .with_code(ErrorCode::E207)
                        .with_path(format!("{path}.id"))
                        .with_help("`.` separates the component from the port in a connection"),
                );
                continue;
            }

            if let Some(first) = siblings.get(id) {
                self.diagnostics.emit(
                    Diagnostic::error(format!("component id `{id}` is declared more than once"))
                        .with_code(ErrorCode::E208)
                        .with_path(format!("{path}.id"))
                        .with_help(format!("first declared at {base}[{}]", first.index)),
                );
                continue;
            }

            let module_type = match fields.get("type").and_then(Value::as_str) {
                Some(MODULE_TYPE_TAG) => fields.get("moduleType").and_then(Value::as_str),
                _ => None,
            };
            siblings.insert(id, Sibling { index, module_type });
        }

        siblings
    }

    fn check_components(&mut self, components: &'a [Value], base: &str, scope: Scope<'_, 'a>) {
        for (index, component) in components.iter().enumerate() {
            let Value::Object(fields) = component else {
                continue;
            };
            let path = format!("{base}[{index}]");

            let Some(kind) = fields
                .get("type")
                .and_then(Value::as_str)
                .filter(|kind| !kind.is_empty())
            else {
                self.diagnostics.emit(
                    Diagnostic::error("component must have a non-empty string `type`")
                        .with_code(ErrorCode::E209)
                        .with_path(path),
                );
                continue;
            };

            match fields.get("label") {
                Some(label) if !label.is_string() => self.diagnostics.emit(
                    Diagnostic::error(format!("`label` must be a string, found {}", json_kind(label)))
                        .with_code(ErrorCode::E200)
                        .with_path(format!("{path}.label")),
                ),
                _ => {}
            }

            match fields.get("moduleType") {
                Some(module_type) if kind != MODULE_TYPE_TAG && !module_type.is_string() => {
                    self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "`moduleType` must be a string, found {}",
                            json_kind(module_type)
                        ))
                        .with_code(ErrorCode::E200)
                        .with_path(format!("{path}.moduleType")),
                    )
                }
                _ => {}
            }

            if kind == MODULE_TYPE_TAG {
                self.check_module_instance(fields, &path, scope);
            } else {
                self.check_primitive(fields, kind, &path, scope);
            }
        }
    }

    fn check_module_instance(
        &mut self,
        fields: &'a Map<String, Value>,
        path: &str,
        scope: Scope<'_, 'a>,
    ) {
        let module_type = self.resolve_module_type(fields, path);

        let inputs = match fields.get(INPUTS_KEY) {
            Some(Value::Object(inputs)) => inputs,
            other => {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "module instance `{INPUTS_KEY}` must be an object, found {}",
                        other.map_or("nothing", json_kind)
                    ))
                    .with_code(ErrorCode::E200)
                    .with_path(format!("{path}.{INPUTS_KEY}")),
                );
                return;
            }
        };

        let declared = module_type.and_then(|module_type| {
            self.signatures[module_type]
                .inputs
                .as_ref()
                .map(|inputs| (module_type, inputs.clone()))
        });

        let Some((module_type, declared)) = declared else {
            // Without a usable target signature only the connections themselves are checked.
            for (input, connection) in inputs {
                let input_path = format!("{path}.{INPUTS_KEY}.{input}");
                self.check_instance_connection(connection, &input_path, scope);
            }
            return;
        };

        for &(input, size) in &declared {
            let input_path = format!("{path}.{INPUTS_KEY}.{input}");
            let Some(connection) = inputs.get(input) else {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "module instance does not supply input `{input}` of `{module_type}`"
                    ))
                    .with_code(ErrorCode::E301)
                    .with_path(format!("{path}.{INPUTS_KEY}")),
                );
                continue;
            };

            match (size, connection) {
                (1, Value::String(_)) => self.check_connection_value(connection, &input_path, scope),
                (1, other) => self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "input `{input}` of `{module_type}` is scalar and expects one connection \
                         string, found {}",
                        json_kind(other)
                    ))
                    .with_code(ErrorCode::E302)
                    .with_path(input_path),
                ),
                (size, Value::Array(elements)) if elements.len() == size => {
                    for (element_index, element) in elements.iter().enumerate() {
                        let element_path = format!("{input_path}[{element_index}]");
                        self.check_connection_value(element, &element_path, scope);
                    }
                }
                (size, other) => {
                    let found = match other {
                        Value::Array(elements) => format!("{} connections", elements.len()),
                        other => json_kind(other).to_string(),
                    };
                    self.diagnostics.emit(
                        Diagnostic::error(format!(
                            "bus input `{input}` of `{module_type}` expects an array of {size} \
                             connections, found {found}"
                        ))
                        .with_code(ErrorCode::E302)
                        .with_path(input_path)
                        .with_help("supply exactly one connection per bus element"),
                    );
                }
            }
        }

        for (input, connection) in inputs {
            if declared.iter().any(|(name, _)| name == input) {
                continue;
            }
            let input_path = format!("{path}.{INPUTS_KEY}.{input}");
            self.diagnostics.emit(
                Diagnostic::warning(format!(
                    "`{module_type}` does not declare an input named `{input}`; it is ignored"
                ))
                .with_code(ErrorCode::E308)
                .with_path(input_path.clone()),
            );
            // Ignored, but it is still read as a connection.
            self.check_instance_connection(connection, &input_path, scope);
        }
    }

    /// Checks a module instance connection of any width.
    fn check_instance_connection(&mut self, connection: &Value, path: &str, scope: Scope<'_, 'a>) {
        match connection {
            Value::Array(elements) => {
                for (element_index, element) in elements.iter().enumerate() {
                    let element_path = format!("{path}[{element_index}]");
                    self.check_connection_value(element, &element_path, scope);
                }
            }
            single => self.check_connection_value(single, path, scope),
        }
    }

    /// Resolves `moduleType` to a known definition name, reporting failures.
    fn resolve_module_type(&mut self, fields: &'a Map<String, Value>, path: &str) -> Option<&'a str> {
        let type_path = format!("{path}.moduleType");
        let Some(module_type) = fields.get("moduleType").and_then(Value::as_str) else {
            self.diagnostics.emit(
                Diagnostic::error("module instance must name its definition in `moduleType`")
                    .with_code(ErrorCode::E300)
                    .with_path(type_path),
            );
            return None;
        };

        if !self.hierarchical {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "module instance refers to `{module_type}`, but a flat diagram has no \
                     module definitions"
                ))
                .with_code(ErrorCode::E300)
                .with_path(type_path)
                .with_help(format!(
                    "use the `{{{ENTRY_POINT_KEY}, {DEFINITIONS_KEY}}}` shape to define modules"
                )),
            );
            return None;
        }

        match self.signatures.get_key_value(module_type) {
            Some((&name, _)) => Some(name),
            None => {
                let help = self.defined_types_help();
                self.diagnostics.emit(
                    Diagnostic::error(format!("undefined module type `{module_type}`"))
                        .with_code(ErrorCode::E300)
                        .with_path(type_path)
                        .with_help(help),
                );
                None
            }
        }
    }

    fn check_primitive(
        &mut self,
        fields: &'a Map<String, Value>,
        kind: &str,
        path: &str,
        scope: Scope<'_, 'a>,
    ) {
        let Some(inputs) = fields.get(INPUTS_KEY) else {
            return;
        };
        let inputs_path = format!("{path}.{INPUTS_KEY}");

        // Ignored on `input` primitives, but still read as connections.
        if kind == "input" {
            self.diagnostics.emit(
                Diagnostic::warning("`input` primitives take no inputs; they are ignored")
                    .with_code(ErrorCode::E211)
                    .with_path(inputs_path.clone()),
            );
        }

        let Value::Object(inputs) = inputs else {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "primitive `{INPUTS_KEY}` must be an object mapping port names to \
                     connections, found {}",
                    json_kind(inputs)
                ))
                .with_code(ErrorCode::E200)
                .with_path(inputs_path),
            );
            return;
        };

        for (port, connection) in inputs {
            let port_path = format!("{inputs_path}.{port}");
            if connection.is_array() {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "connection for port `{port}` must be a string, found an array"
                    ))
                    .with_code(ErrorCode::E309)
                    .with_path(port_path)
                    .with_help("only module instance inputs accept bus connections"),
                );
                continue;
            }
            self.check_connection_value(connection, &port_path, scope);
        }
    }

    fn check_connection_value(&mut self, connection: &Value, path: &str, scope: Scope<'_, 'a>) {
        match connection.as_str() {
            Some(raw) => self.check_reference(raw, path, scope),
            None => self.diagnostics.emit(
                Diagnostic::error(format!(
                    "connection must be a string, found {}",
                    json_kind(connection)
                ))
                .with_code(ErrorCode::E309)
                .with_path(path),
            ),
        }
    }

    fn check_reference(&mut self, raw: &str, path: &str, scope: Scope<'_, 'a>) {
        let reference = match raw.parse::<Reference>() {
            Ok(reference) => reference,
            Err(err) => {
                self.diagnostics.emit(
                    Diagnostic::error(err.to_string())
                        .with_code(ErrorCode::E303)
                        .with_path(path),
                );
                return;
            }
        };

        match reference {
            Reference::Component { source, port } => match scope.siblings.get(source.as_str()) {
                Some(sibling) => self.check_instance_output(sibling, &source, &port, path),
                None => self.diagnostics.emit(
                    Diagnostic::error(format!("undefined component `{source}`"))
                        .with_code(ErrorCode::E307)
                        .with_path(path),
                ),
            },
            Reference::ModuleInput { name, index } => {
                self.check_module_input_reference(raw, &name, index, path, scope.inputs);
            }
        }
    }

    fn check_module_input_reference(
        &mut self,
        raw: &str,
        name: &str,
        index: Option<usize>,
        path: &str,
        inputs: ScopeInputs<'_, 'a>,
    ) {
        let declared = match inputs {
            ScopeInputs::Unknown => return,
            ScopeInputs::Root => {
                self.diagnostics.emit(
                    Diagnostic::error(format!(
                        "module input reference `{raw}` is only valid inside a module definition"
                    ))
                    .with_code(ErrorCode::E304)
                    .with_path(path),
                );
                return;
            }
            ScopeInputs::Declared(declared) => declared,
        };

        let Some(&(_, size)) = declared.iter().find(|(input, _)| *input == name) else {
            self.diagnostics.emit(
                Diagnostic::error(format!("`{raw}` references undeclared module input `{name}`"))
                    .with_code(ErrorCode::E304)
                    .with_path(path)
                    .with_help(list_help("declared inputs", declared.iter().map(|(input, _)| *input))),
            );
            return;
        };

        match index {
            None if size > 1 => self.diagnostics.emit(
                Diagnostic::error(format!(
                    "bus input `{name}` has size {size} and must be indexed"
                ))
                .with_code(ErrorCode::E305)
                .with_path(path)
                .with_help(format!(
                    "use `{MODULE_INPUT_PREFIX}{name}[0]` through `{MODULE_INPUT_PREFIX}{name}[{}]`",
                    size - 1
                )),
            ),
            Some(_) if size == 1 => self.diagnostics.emit(
                Diagnostic::error(format!("scalar input `{name}` cannot be indexed"))
                    .with_code(ErrorCode::E305)
                    .with_path(path)
                    .with_help(format!("use `{MODULE_INPUT_PREFIX}{name}`")),
            ),
            Some(index) if index >= size => self.diagnostics.emit(
                Diagnostic::error(format!(
                    "index {index} is out of bounds for bus input `{name}` of size {size}"
                ))
                .with_code(ErrorCode::E306)
                .with_path(path)
                .with_help(format!("valid indices are 0..={}", size - 1)),
            ),
            _ => {}
        }
    }

    /// Reading a module instance's port requires the port to be a declared
    /// output of its definition.
    fn check_instance_output(&mut self, sibling: &Sibling<'a>, source: &str, port: &str, path: &str) {
        let Some(module_type) = sibling.module_type else {
            return;
        };
        let Some(outputs) = self
            .signatures
            .get(module_type)
            .and_then(|signature| signature.outputs.as_deref())
        else {
            return;
        };

        if !outputs.contains(&port) {
            self.diagnostics.emit(
                Diagnostic::error(format!(
                    "module `{module_type}` (instance `{source}`) has no output `{port}`"
                ))
                .with_code(ErrorCode::E310)
                .with_path(path)
                .with_help(list_help("declared outputs", outputs.iter().copied())),
            );
        }
    }

    fn required_array(
        &mut self,
        fields: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'a Vec<Value>> {
        match fields.get(key) {
            Some(Value::Array(values)) => Some(values),
            Some(other) => {
                self.diagnostics.emit(
                    Diagnostic::error(format!("`{key}` must be an array, found {}", json_kind(other)))
                        .with_code(ErrorCode::E200)
                        .with_path(format!("{path}.{key}")),
                );
                None
            }
            None => {
                self.emit_missing_key(key, path);
                None
            }
        }
    }

    fn required_object(
        &mut self,
        fields: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'a Map<String, Value>> {
        match fields.get(key) {
            Some(Value::Object(values)) => Some(values),
            Some(other) => {
                self.diagnostics.emit(
                    Diagnostic::error(format!("`{key}` must be an object, found {}", json_kind(other)))
                        .with_code(ErrorCode::E200)
                        .with_path(format!("{path}.{key}")),
                );
                None
            }
            None => {
                self.emit_missing_key(key, path);
                None
            }
        }
    }

    fn emit_missing_key(&mut self, key: &str, path: &str) {
        self.diagnostics.emit(
            Diagnostic::error(format!("missing required key `{key}`"))
                .with_code(ErrorCode::E101)
                .with_path(path),
        );
    }

    fn defined_types_help(&self) -> String {
        list_help("defined module types", self.signatures.keys().copied())
    }
}

fn list_help<'n>(what: &str, names: impl Iterator<Item = &'n str>) -> String {
    let names: Vec<_> = names.map(|name| format!("`{name}`")).collect();
    if names.is_empty() {
        format!("there are no {what}")
    } else {
        format!("{what}: {}", names.join(", "))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
