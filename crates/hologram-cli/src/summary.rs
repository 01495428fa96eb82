use console::Style;
use hologram_core::config::PipelineConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Hologram Pipeline"));
    println!("  {}", s.title.apply_to("\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"));
    println!();

    println!("  {}", s.header.apply_to("Aligner"));
    println!(
        "    {:<16}{:?}",
        s.label.apply_to("Detector"),
        config.aligner.detector
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Max features"),
        s.value.apply_to(config.aligner.max_features)
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("RANSAC thresh"),
        s.value.apply_to(config.aligner.ransac_threshold)
    );
    println!();

    println!("  {}", s.header.apply_to("Accumulator"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Buffer size"),
        s.value.apply_to(config.accumulator.buffer_size)
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Min area"),
        s.value.apply_to(config.accumulator.min_area)
    );
    println!();

    println!("  {}", s.header.apply_to("Selector"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Min region area"),
        s.value.apply_to(config.selector.min_region_area)
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Hue var max"),
        s.value.apply_to(config.selector.hue_variance_threshold)
    );
    println!();

    println!("  {}", s.header.apply_to("Verifier"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Background frames"),
        s.value.apply_to(config.verifier.background_frames)
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Use classifier"),
        s.value.apply_to(config.verifier.use_classifier)
    );
    println!();

    println!("  {}", s.header.apply_to("Coordinator"));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Confidence thr"),
        s.value.apply_to(config.coordinator.confidence_threshold)
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("NMS IoU thr"),
        s.value.apply_to(config.coordinator.nms_iou_threshold)
    );
    println!();
}
