use std::path::PathBuf;

use catds_runtime::StateFormat;

const ROM_EXTENSIONS: &[&str] = &["nds", "srl"];

pub fn pick_rom_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("Nintendo DS ROM", ROM_EXTENSIONS)
        .add_filter("All files", &["*"])
        .pick_file()
}

fn with_state_filters(dialog: rfd::FileDialog) -> rfd::FileDialog {
    [StateFormat::Native, StateFormat::Core]
        .into_iter()
        .fold(dialog, |dialog, format| {
            dialog.add_filter(format.label(), &[format.extension()])
        })
}

pub fn save_state_dialog() -> Option<PathBuf> {
    let name = format!("state.{}", StateFormat::Native.extension());
    with_state_filters(rfd::FileDialog::new())
        .set_file_name(name)
        .save_file()
}

pub fn pick_state_dialog() -> Option<PathBuf> {
    with_state_filters(rfd::FileDialog::new()).pick_file()
}

pub fn save_screenshot_dialog(file_name: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .add_filter("PNG image", &["png"])
        .set_file_name(file_name)
        .save_file()
}
