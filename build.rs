// Copyright (c) 2023 Jonathan "Razordor" Alan Thomason

// Compiles the C fixtures under `tests/fixtures` into shared libraries so the
// integration tests have real modules to load. Their locations are exported
// as `SHLIB_FIXTURE_<NAME>` environment variables at compile time.

use std::env;
use std::path::{Path, PathBuf};

const FIXTURES: &[(&str, &str)] = &[
	("adder", "tests/fixtures/adder.c"),
	("multiplier", "tests/fixtures/multiplier.c"),
];

fn main() {
	let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
	let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

	for (name, source) in FIXTURES {
		let output = out_dir.join(dylib_file_name(name, &target_os));
		if let Err(msg) = compile_shared(source, &output, &out_dir, &target_os) {
			// a missing C toolchain must not break builds of dependents
			println!("cargo:warning=test fixture `{name}` was not built: {msg}");
		}
		println!(
			"cargo:rustc-env=SHLIB_FIXTURE_{}={}",
			name.to_uppercase(),
			output.display()
		);
		println!("cargo:rerun-if-changed={source}");
	}
	println!("cargo:rerun-if-changed=build.rs");
}

fn dylib_file_name(name: &str, target_os: &str) -> String {
	match target_os {
		"windows" => format!("{name}.dll"),
		"macos" | "ios" => format!("lib{name}.dylib"),
		_ => format!("lib{name}.so"),
	}
}

fn compile_shared(source: &str, output: &Path, out_dir: &Path, target_os: &str) -> Result<(), String> {
	let compiler = cc::Build::new()
		.cargo_metadata(false)
		.try_get_compiler()
		.map_err(|e| e.to_string())?;
	let mut cmd = compiler.to_command();
	if compiler.is_like_msvc() {
		cmd.arg("/nologo")
			.arg("/LD")
			.arg(source)
			.arg(format!("/Fo{}\\", out_dir.display()))
			.arg(format!("/Fe{}", output.display()));
	} else {
		if target_os == "macos" || target_os == "ios" {
			cmd.arg("-dynamiclib");
		} else {
			cmd.arg("-shared");
		}
		cmd.arg("-fPIC").arg("-o").arg(output).arg(source);
	}
	let status = cmd.status().map_err(|e| e.to_string())?;
	if status.success() {
		Ok(())
	} else {
		Err(format!("compiler exited with {status}"))
	}
}
