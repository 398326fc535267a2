//! KDL bindings file parser

use std::path::Path;

use miette::LabeledSpan;

use crate::error::{ConfigError, InvalidDescriptorInfo, SourceLocation};
use crate::hotkey::{parse_hotkey, HotkeyDescriptor};
use crate::model::*;
use crate::platform::Platform;

/// Extract source location from a KDL node's name span
fn get_node_location(node: &kdl::KdlNode, source: &str) -> SourceLocation {
    let span = node.name().span();
    location_of(source, span.offset(), span.len())
}

/// Extract source location from a KDL entry (for descriptor arguments)
fn get_entry_location(entry: &kdl::KdlEntry, source: &str) -> SourceLocation {
    let span = entry.span();
    location_of(source, span.offset(), span.len())
}

fn location_of(source: &str, offset: usize, len: usize) -> SourceLocation {
    let (line, column) = offset_to_line_col(source, offset);
    SourceLocation::new(line, column, offset, len)
}

/// Convert byte offset to line and column (1-indexed)
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Parse a bindings file from the given path
pub fn parse_config(path: &Path) -> Result<BindingsConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse bindings from a string
pub fn parse_config_str(content: &str) -> Result<BindingsConfig, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so we need to extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = BindingsConfig::default();

    // Settings first: the platform decides how descriptors below resolve
    for node in doc.nodes() {
        if node.name().value() == "settings" {
            config.settings = parse_settings(node)?;
        }
    }
    let platform = config.settings.platform.unwrap_or_else(Platform::detect);

    let mut invalid = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "settings" => {}
            "element" => {
                let element = parse_element(node)?;
                if let Some(parent) = &element.parent {
                    if !config.elements.iter().any(|e| &e.name == parent) {
                        return Err(ConfigError::Invalid {
                            message: format!(
                                "Element '{}' names parent '{}' which is not declared before it",
                                element.name, parent
                            ),
                        });
                    }
                }
                if config.elements.iter().any(|e| e.name == element.name) {
                    return Err(ConfigError::Invalid {
                        message: format!("Element '{}' is declared twice", element.name),
                    });
                }
                config.elements.push(element);
            }
            "hotkey" => {
                let binding = parse_hotkey_node(node, content, platform, &mut invalid)?;
                config.hotkeys.push(binding);
            }
            "sequence" => {
                let binding = parse_sequence_node(node, content, platform, &mut invalid)?;
                config.sequences.push(binding);
            }
            "replay" => {
                config.replay = parse_replay(node)?;
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    // If we accumulated any invalid descriptors, return them all together with source context
    if !invalid.is_empty() {
        let labels = invalid
            .iter()
            .map(|info: &InvalidDescriptorInfo| {
                LabeledSpan::new(
                    Some(info.reason.clone()),
                    info.location.offset,
                    info.location.len,
                )
            })
            .collect();
        return Err(ConfigError::InvalidDescriptors {
            src: content.to_string(),
            labels,
            invalid,
        });
    }

    // Scopes must name declared elements
    for binding in &config.hotkeys {
        if let Some(scope) = &binding.scope {
            if !config.elements.iter().any(|e| &e.name == scope) {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "Hotkey '{}' is scoped to unknown element '{}'",
                        binding.hotkey, scope
                    ),
                });
            }
        }
    }
    for step in &config.replay {
        if let ReplayStep::Focus(Some(name)) = step {
            if !config.elements.iter().any(|e| &e.name == name) {
                return Err(ConfigError::Invalid {
                    message: format!("Replay focuses unknown element '{}'", name),
                });
            }
        }
    }

    Ok(config)
}

/// First positional argument of a node
fn argument(node: &kdl::KdlNode) -> Option<&kdl::KdlEntry> {
    node.entries().iter().find(|e| e.name().is_none())
}

/// Named property of a node
fn property<'a>(node: &'a kdl::KdlNode, name: &str) -> Option<&'a kdl::KdlEntry> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(name))
}

fn string_value(entry: &kdl::KdlEntry, field: &str) -> Result<String, ConfigError> {
    entry
        .value()
        .as_string()
        .map(|s| s.to_string())
        .ok_or_else(|| ConfigError::Invalid {
            message: format!("'{}' must be a string", field),
        })
}

fn bool_value(entry: &kdl::KdlEntry, field: &str) -> Result<bool, ConfigError> {
    entry.value().as_bool().ok_or_else(|| ConfigError::Invalid {
        message: format!("'{}' must be true or false", field),
    })
}

fn u64_value(entry: &kdl::KdlEntry, field: &str) -> Result<u64, ConfigError> {
    entry
        .value()
        .as_i64()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| ConfigError::Invalid {
            message: format!("'{}' must be a non-negative integer", field),
        })
}

fn parse_settings(node: &kdl::KdlNode) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let Some(entry) = argument(child) else {
                continue;
            };
            match child.name().value() {
                "platform" => {
                    let val = string_value(entry, "platform")?;
                    settings.platform =
                        Some(val.parse().map_err(|e| ConfigError::Invalid { message: e })?);
                }
                "log-level" => {
                    let val = string_value(entry, "log-level")?;
                    settings.log_level =
                        val.parse().map_err(|e| ConfigError::Invalid { message: e })?;
                }
                "sequence-timeout" => {
                    settings.sequence_timeout_ms = u64_value(entry, "sequence-timeout")?;
                }
                name => {
                    tracing::warn!("Unknown settings option: {}", name);
                }
            }
        }
    }

    Ok(settings)
}

fn parse_element(node: &kdl::KdlNode) -> Result<ElementSpec, ConfigError> {
    let name = argument(node)
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| ConfigError::MissingField {
            field: "element name (e.g., `element \"search\" kind=\"input\"`)".to_string(),
        })?;

    let kind = match property(node, "kind") {
        Some(entry) => string_value(entry, "kind")?,
        None => "div".to_string(),
    };
    let parent = property(node, "parent")
        .map(|entry| string_value(entry, "parent"))
        .transpose()?;
    let editable = property(node, "editable")
        .map(|entry| bool_value(entry, "editable"))
        .transpose()?
        .unwrap_or(false);

    Ok(ElementSpec {
        name,
        kind,
        parent,
        editable,
    })
}

/// Record a descriptor that doesn't parse on the configured platform
fn check_descriptor(
    descriptor: &str,
    location: SourceLocation,
    platform: Platform,
    invalid: &mut Vec<InvalidDescriptorInfo>,
) {
    if let Err(e) = parse_hotkey(&HotkeyDescriptor::from(descriptor), platform) {
        invalid.push(InvalidDescriptorInfo {
            descriptor: descriptor.to_string(),
            reason: e.to_string(),
            location,
        });
    }
}

fn parse_hotkey_node(
    node: &kdl::KdlNode,
    source: &str,
    platform: Platform,
    invalid: &mut Vec<InvalidDescriptorInfo>,
) -> Result<HotkeyBinding, ConfigError> {
    let entry = argument(node).ok_or_else(|| ConfigError::MissingField {
        field: "hotkey descriptor (e.g., `hotkey \"Mod+S\" action=\"save\"`)".to_string(),
    })?;
    let hotkey = string_value(entry, "hotkey")?;
    check_descriptor(&hotkey, get_entry_location(entry, source), platform, invalid);

    let action = property(node, "action")
        .map(|entry| string_value(entry, "action"))
        .transpose()?
        .ok_or_else(|| ConfigError::MissingField {
            field: format!("action for hotkey '{}'", hotkey),
        })?;

    let mut binding = HotkeyBinding::new(hotkey, action);

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let name = child.name().value();
            let Some(entry) = argument(child) else {
                return Err(ConfigError::MissingField {
                    field: format!("value for '{}' in hotkey '{}'", name, binding.hotkey),
                });
            };
            match name {
                "scope" => binding.scope = Some(string_value(entry, name)?),
                "trigger" => {
                    binding.trigger = string_value(entry, name)?
                        .parse()
                        .map_err(|e| ConfigError::Invalid { message: e })?;
                }
                "conflict" => {
                    binding.conflict = string_value(entry, name)?
                        .parse()
                        .map_err(|e| ConfigError::Invalid { message: e })?;
                }
                "enabled" => binding.enabled = bool_value(entry, name)?,
                "prevent-default" => binding.prevent_default = bool_value(entry, name)?,
                "stop-propagation" => binding.stop_propagation = bool_value(entry, name)?,
                "require-reset" => binding.require_reset = bool_value(entry, name)?,
                "ignore-inputs" => binding.ignore_inputs = bool_value(entry, name)?,
                _ => {
                    tracing::warn!(
                        "Unknown hotkey option '{}' at line {}",
                        name,
                        get_node_location(child, source).line
                    );
                }
            }
        }
    }

    Ok(binding)
}

fn parse_sequence_node(
    node: &kdl::KdlNode,
    source: &str,
    platform: Platform,
    invalid: &mut Vec<InvalidDescriptorInfo>,
) -> Result<SequenceBinding, ConfigError> {
    let entry = argument(node).ok_or_else(|| ConfigError::MissingField {
        field: "sequence keys (e.g., `sequence \"g g\" action=\"top\"`)".to_string(),
    })?;
    let text = string_value(entry, "sequence")?;
    let steps: Vec<String> = text.split_whitespace().map(|s| s.to_string()).collect();

    if steps.is_empty() {
        return Err(ConfigError::Invalid {
            message: "Sequence must contain at least one key".to_string(),
        });
    }
    let location = get_entry_location(entry, source);
    for step in &steps {
        check_descriptor(step, location, platform, invalid);
    }

    let action = property(node, "action")
        .map(|entry| string_value(entry, "action"))
        .transpose()?
        .ok_or_else(|| ConfigError::MissingField {
            field: format!("action for sequence '{}'", text),
        })?;
    let timeout_ms = property(node, "timeout")
        .map(|entry| u64_value(entry, "timeout"))
        .transpose()?;

    Ok(SequenceBinding {
        steps,
        action,
        timeout_ms,
    })
}

fn parse_replay(node: &kdl::KdlNode) -> Result<Vec<ReplayStep>, ConfigError> {
    let mut steps = Vec::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let name = child.name().value();
            let entry = argument(child);

            let step = match (name, entry) {
                ("focus", None) => ReplayStep::Focus(None),
                ("focus", Some(entry)) => ReplayStep::Focus(Some(string_value(entry, name)?)),
                ("press", Some(entry)) => ReplayStep::Press(string_value(entry, name)?),
                ("release", Some(entry)) => ReplayStep::Release(string_value(entry, name)?),
                ("tap", Some(entry)) => ReplayStep::Tap(string_value(entry, name)?),
                ("delay", Some(entry)) => ReplayStep::Delay(u64_value(entry, name)?),
                ("press" | "release" | "tap" | "delay", None) => {
                    return Err(ConfigError::MissingField {
                        field: format!("value for replay step '{}'", name),
                    });
                }
                _ => {
                    tracing::warn!("Unknown replay step: {}", name);
                    continue;
                }
            };
            steps.push(step);
        }
    }

    Ok(steps)
}
