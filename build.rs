fn main() {
    println!("cargo::rerun-if-env-changed=ARRAYCHECK_VERSION");
}
