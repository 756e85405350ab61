use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn main() -> Result<(), Box<dyn Error>> {
    let profile = env::var("PROFILE")?;

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../umbra-shader-builder/Cargo.toml");
    println!("cargo:rerun-if-changed=../umbra-shader-builder/src/main.rs");
    println!("cargo:rerun-if-changed=../umbra-shaders/src");
    println!("cargo:rerun-if-changed=../umbra-gpu/src");
    println!("cargo:rerun-if-env-changed=UMBRA_SKIP_SHADERS");
    println!("cargo:rustc-env=PROFILE={profile}");

    if env::var_os("UMBRA_SKIP_SHADERS").is_some() {
        println!("cargo:warning=UMBRA_SKIP_SHADERS is set, shaders won't be compiled");
        return Ok(());
    }

    let mut dir = PathBuf::from(env::var_os("OUT_DIR").ok_or("OUT_DIR not set")?);

    // Strip `$profile/build/*/out`.
    let ok = dir.ends_with("out")
        && dir.pop()
        && dir.pop()
        && dir.ends_with("build")
        && dir.pop()
        && dir.ends_with(&profile)
        && dir.pop();

    assert!(ok);

    let dir = dir.join("shader-builder");

    // The shader builder prints `cargo:rustc-env=...` lines describing the
    // compiled modules; we forward them to Cargo as they are
    let output = Command::new("cargo")
        .args([
            "run",
            "--release",
            "-p",
            "umbra-shader-builder",
            "--target-dir",
        ])
        .arg(dir)
        .env_remove("CARGO_ENCODED_RUSTFLAGS")
        .stderr(Stdio::inherit())
        .output();

    match output {
        Ok(output) if output.status.success() => {
            print!("{}", String::from_utf8_lossy(&output.stdout));
        }

        Ok(output) => {
            println!(
                "cargo:warning=couldn't compile shaders (shader builder exited with {}); \
                 `Engine::new()` will report them as missing",
                output.status,
            );
        }

        Err(err) => {
            println!(
                "cargo:warning=couldn't launch shader builder ({err}); \
                 `Engine::new()` will report shaders as missing",
            );
        }
    }

    Ok(())
}
