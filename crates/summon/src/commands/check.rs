use summon_core::HotkeyBinding;

/// Parses and resolves a binding, printing its canonical form.
///
/// Exits with status 1 if the binding is invalid. Never touches the OS
/// hotkey table.
pub fn execute(input: &str) {
    let binding = match input.parse::<HotkeyBinding>() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Invalid binding: {e}");
            std::process::exit(1);
        }
    };

    match binding.resolve() {
        Ok(resolved) => println!(
            "{binding} is valid (modifiers=0x{:04X}, vk=0x{:02X})",
            resolved.modifiers, resolved.vk
        ),
        Err(e) => {
            eprintln!("Invalid binding: {e}");
            std::process::exit(1);
        }
    }
}
