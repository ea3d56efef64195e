//! Template content for generated build inputs.

/// Template for go.mod.
/// Contains {module}, {go_version} and {requires} placeholders for substitution
pub const GO_MOD_TEMPLATE: &str = "module {module}

go {go_version}

require (
{requires})
";

/// Template for main.go.
/// Contains {base} and {imports} placeholders for substitution
pub const MAIN_GO_TEMPLATE: &str = r#"// Code generated by pbforge. DO NOT EDIT.

package main

import (
	"log"

	app "{base}"

{imports})

func main() {
	if err := app.New().Start(); err != nil {
		log.Fatal(err)
	}
}
"#;
