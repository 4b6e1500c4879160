fn main() {
    // Tauri build script
    tauri_build::build();
}
