//! Test fixtures - script sources and canned compiler output

/// Minimal plugin source
pub fn script_source(name: &str) -> String {
    format!(
        r#"#include <amxmodx>
#include <shared>

public plugin_init() {{
    register_plugin("{name}", "1.0.0", "Tests");
}}
"#
    )
}

/// Minimal include file
pub fn include_source() -> &'static str {
    r#"#if defined _shared_included
    #endinput
#endif
#define _shared_included

stock shared_value() {
    return 1;
}
"#
}

/// Banner printed by the compiler on every run
pub fn compiler_banner() -> &'static str {
    "AMX Mod X Compiler 1.8.2\nCopyright (c) 1997-2006 ITB CompuPhase\nCopyright (c) 2004-2013 AMX Mod X Team\n\n"
}

/// Output of a clean compile
pub fn success_output() -> String {
    format!(
        "{}Header size:            188 bytes\nCode size:              112 bytes\nDone.\n",
        compiler_banner()
    )
}

/// Output of a compile that emits a warning but succeeds
pub fn warning_output(script: &str) -> String {
    format!(
        "{}{script}(4) : warning 217: loose indentation\nDone.\n",
        compiler_banner()
    )
}

/// Output of a compile that fails with a structured error
pub fn error_output(script: &str) -> String {
    format!(
        "{}{script}(7) : error 17: undefined symbol \"foo\"\n\n1 Error.\nCould not locate output file {script}.amx (compile failed).\n",
        compiler_banner()
    )
}

/// Shell stand-in for `amxxpc`.
///
/// Copies the script to the `-o` destination and prints a warning, except
/// for scripts named `broken.sma`, which fail with a structured error.
/// Records its working directory in `last-cwd` next to itself.
pub const FAKE_AMXXPC: &str = r#"#!/bin/sh
script="$1"
out=""
for arg in "$@"; do
    case "$arg" in
        -o*) out="${arg#-o}" ;;
    esac
done
pwd > "$(dirname "$0")/last-cwd"
echo "AMX Mod X Compiler 1.8.2"
case "$script" in
    *broken.sma)
        echo "$script(3) : error 17: undefined symbol \"foo\""
        echo "1 Error."
        exit 1
        ;;
esac
echo "$script(1) : warning 217: loose indentation"
cp "$script" "$out"
echo "Done."
"#;
