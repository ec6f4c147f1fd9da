use summon_core::keys;

/// Prints every accepted key name, one per line.
pub fn execute() {
    for name in keys::supported_names() {
        println!("{name}");
    }
    println!("\nModifiers: Ctrl, Alt, Shift, Meta (also Win, Super)");
}
