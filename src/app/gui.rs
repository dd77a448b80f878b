use crate::app::App;
use egui::{Align, Color32, Frame, Layout, RichText, Rounding, Stroke};

const BACKGROUND: Color32 = Color32::from_rgb(0xf0, 0xf0, 0xf0);
const TEXT: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);
const DROP_TEXT: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);
const BORDER: Color32 = Color32::from_rgb(0xdd, 0xdd, 0xdd);
const BORDER_HOVER: Color32 = Color32::from_rgb(0x4a, 0x90, 0xe2);

pub fn render(app: &mut App, ctx: &egui::Context) {
    let frame = Frame {
        fill: BACKGROUND,
        inner_margin: egui::style::Margin::same(20.0),
        ..Default::default()
    };

    let files_hovering = !ctx.input().raw.hovered_files.is_empty();

    egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.heading(RichText::new("WebP to JPEG Converter").size(20.0).strong().color(TEXT));
        });
        ui.add_space(20.0);

        ui.horizontal(|ui| {
            ui.label(RichText::new("Output folder:").size(14.0).color(TEXT));
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("Change Folder").clicked() {
                    app.change_output_directory();
                }
            });
        });
        ui.add_space(15.0);

        let drop_zone = Frame {
            fill: Color32::WHITE,
            rounding: Rounding::same(4.0),
            stroke: Stroke::new(2.0, if files_hovering { BORDER_HOVER } else { BORDER }),
            inner_margin: egui::style::Margin::same(20.0),
            ..Default::default()
        };
        drop_zone.show(ui, |ui| {
            ui.set_min_size(ui.available_size());
            ui.centered_and_justified(|ui| {
                let text = format!(
                    "Drag and drop WebP files here\n\nFiles will be saved to:\n{}",
                    app.config.output_dir().display()
                );
                ui.label(RichText::new(text).size(14.0).color(DROP_TEXT));
            });
        });
    });
}
