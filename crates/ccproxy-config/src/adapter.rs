use indexmap::IndexMap;
use indoc::indoc;
use serde::Deserialize;

/// Usage contract placed at the top of the `tools` prompt section
///
/// Describes the `<use tool="...">` markup the backend must produce to
/// request a tool call, followed by one good and two bad examples. The
/// examples are tab-indented.
pub const DEFAULT_TOOL_INSTRUCTIONS: &str = r#"USE TOOL
--------
Specify what tool to use and the required arguments in <use></use> block.
- Place tool name in "tool" attribute.
- Place tool arguments between <use> and </use>
- The tool arguments MUST be a valid JSON object that can be validated against the tool's input JSON schema.
ALWAYS check the existing facts before calling the tool, DO NOT call tools repeatedly.
Once you respond with </use>, you STOP.

<examples>
	<good_example>
		<use tool="Edit">
		{
			"file_path": "/path/to/main.py",
			"old_string": "class Snippet:\n    def __init__(self, file_path, line_no, lines):",
			"new_string": "class Snippet:\n    def __init__(self, file_path, line_no, lines, context_range=4):"
		}
		</use>
	</good_example>

	<bad_example>
		<use>
		{
			"tool": "Edit",
			"file_path": "/path/to/main.py",
			"old_string": "class Snippet:\n    def __init__(self, file_path, line_no, lines):",
			"new_string": "class Snippet:\n    def __init__(self, file_path, line_no, lines, context_range=4):"
		}
		</use>
		<reasoning>
			The tool name should be placed in "tool" attribute!
		</reasoning>
	</bad_example>

	<bad_example>
		<use tool="Read">
			<file_path>/path/to/main.go</file_path>
			<offset>116</offset>
			<limit>110</limit>
		</use>
		<reasoning>
			The tool arguments MUST be a valid JSON object.
		</reasoning>
	</bad_example>
</examples>
"#;

/// Heading printed above the JSON tool catalog
pub const DEFAULT_CATALOG_HEADING: &str = indoc! {"
    AVAILABLE TOOLS
    ---------------
"};

/// Built-in deny-list: tool name mapped to whether it is disabled
const DEFAULT_DISABLED_TOOLS: &[(&str, bool)] = &[
    ("Task", true),
    ("Bash", false),
    ("Glob", false),
    ("Grep", false),
    ("LS", false),
    ("ExitPlanMode", true),
    ("Read", false),
    ("Edit", false),
    ("MultiEdit", true),
    ("Write", false),
    ("NotebookEdit", true),
    ("WebFetch", true),
    ("TodoWrite", false),
    ("WebSearch", false),
    ("BashOutput", true),
    ("KillBash", true),
    ("mcp__ide__getDiagnostics", true),
];

/// Prompt composition policy
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterConfig {
    /// Tool name mapped to "disabled"; a file-provided table replaces the
    /// built-in one entirely
    #[serde(default = "default_disabled_tools")]
    pub disabled_tools: IndexMap<String, bool>,
    /// Instructional text of the `tools` section
    #[serde(default)]
    pub tool_contract: ToolContractConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            disabled_tools: default_disabled_tools(),
            tool_contract: ToolContractConfig::default(),
        }
    }
}

impl AdapterConfig {
    /// Whether a tool must be withheld from the backend
    ///
    /// Names are matched exactly; tools absent from the table are offered.
    pub fn is_disabled(&self, tool_name: &str) -> bool {
        self.disabled_tools.get(tool_name).copied().unwrap_or(false)
    }
}

/// Literal instructional text embedded in the `tools` section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolContractConfig {
    /// Markup contract and worked examples
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// Heading placed directly above the serialized tool list
    #[serde(default = "default_catalog_heading")]
    pub catalog_heading: String,
}

impl Default for ToolContractConfig {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            catalog_heading: default_catalog_heading(),
        }
    }
}

fn default_disabled_tools() -> IndexMap<String, bool> {
    DEFAULT_DISABLED_TOOLS
        .iter()
        .map(|(name, disabled)| ((*name).to_string(), *disabled))
        .collect()
}

fn default_instructions() -> String {
    DEFAULT_TOOL_INSTRUCTIONS.to_string()
}

fn default_catalog_heading() -> String {
    DEFAULT_CATALOG_HEADING.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_disables_only_true_entries() {
        let config = AdapterConfig::default();
        assert!(config.is_disabled("Task"));
        assert!(config.is_disabled("mcp__ide__getDiagnostics"));
        assert!(!config.is_disabled("Bash"));
        assert!(!config.is_disabled("Edit"));
    }

    #[test]
    fn unknown_tool_is_offered() {
        let config = AdapterConfig::default();
        assert!(!config.is_disabled("get_weather"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let config = AdapterConfig::default();
        assert!(!config.is_disabled("task"));
    }

    #[test]
    fn file_table_replaces_builtin_list() {
        let toml = r"
            [disabled_tools]
            Bash = true
        ";

        let config: AdapterConfig = toml::from_str(toml).unwrap();
        assert!(config.is_disabled("Bash"));
        assert!(!config.is_disabled("Task"));
        assert_eq!(config.tool_contract.instructions, DEFAULT_TOOL_INSTRUCTIONS);
    }

    #[test]
    fn contract_text_is_overridable() {
        let toml = r#"
            [tool_contract]
            instructions = "Call tools with <use tool=\"NAME\">ARGS</use>."
        "#;

        let config: AdapterConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.tool_contract.instructions,
            "Call tools with <use tool=\"NAME\">ARGS</use>."
        );
        assert_eq!(config.tool_contract.catalog_heading, DEFAULT_CATALOG_HEADING);
    }

    #[test]
    fn default_instructions_describe_markup() {
        assert!(DEFAULT_TOOL_INSTRUCTIONS.starts_with("USE TOOL\n"));
        assert!(DEFAULT_TOOL_INSTRUCTIONS.contains(r#"<use tool="Edit">"#));
        assert!(DEFAULT_TOOL_INSTRUCTIONS.contains(r"class Snippet:\n    def"));
    }

    #[test]
    fn default_examples_are_tab_indented() {
        assert!(DEFAULT_TOOL_INSTRUCTIONS.contains("<examples>\n\t<good_example>\n\t\t<use tool=\"Edit\">\n\t\t{\n"));
        assert!(DEFAULT_TOOL_INSTRUCTIONS.contains("\t\t\t\"tool\": \"Edit\",\n"));
        assert!(DEFAULT_TOOL_INSTRUCTIONS.ends_with("\t\t</reasoning>\n\t</bad_example>\n</examples>\n"));
        assert!(!DEFAULT_TOOL_INSTRUCTIONS.contains("\n  <"));
    }
}
