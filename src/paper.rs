use std::f64::consts::SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Mm,
    In,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperSize {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
}

impl PaperSize {
    fn new(name: &str, width: f64, height: f64, unit: Unit) -> Self {
        PaperSize {
            name: name.to_string(),
            width,
            height,
            unit,
        }
    }

    pub fn width_mm(&self) -> f64 {
        match self.unit {
            Unit::Mm => self.width,
            Unit::In => in_to_mm(self.width),
        }
    }

    pub fn height_mm(&self) -> f64 {
        match self.unit {
            Unit::Mm => self.height,
            Unit::In => in_to_mm(self.height),
        }
    }

    pub fn area_mm(&self) -> f64 {
        self.width_mm() * self.height_mm()
    }
}

pub fn in_to_mm(inches: f64) -> f64 {
    inches * 127.0 / 5.0
}

pub fn mm_to_in(millimeters: f64) -> f64 {
    millimeters * 5.0 / 127.0
}

/// ISO 216 A0 to A10.
pub fn iso_a() -> Vec<PaperSize> {
    (0..11)
        .map(|i| {
            let width = (SQRT_2 / 2f64.powi(i + 1)).sqrt() * 1000.0;
            let height = (SQRT_2 / 2f64.powi(i)).sqrt() * 1000.0;

            PaperSize::new(&format!("A{}", i), width.round(), height.round(), Unit::Mm)
        })
        .collect()
}

pub fn us() -> Vec<PaperSize> {
    vec![
        PaperSize::new("US Letter", 8.5, 11.0, Unit::In),
        PaperSize::new("US Legal", 8.5, 14.0, Unit::In),
        PaperSize::new("US Tabloid", 11.0, 17.0, Unit::In),
    ]
}

/// Every known size, largest area first.
pub fn all_sorted() -> Vec<PaperSize> {
    let mut sizes = iso_a();
    sizes.extend(us());

    sizes.sort_by(|a, b| b.area_mm().partial_cmp(&a.area_mm()).unwrap_or(std::cmp::Ordering::Equal));

    sizes
}

/// Physical size in millimeters of a `width` x `height` pixel scan.
pub fn page_size_mm(width: u32, height: u32, dpi: f64) -> (f64, f64) {
    (
        in_to_mm(f64::from(width) / dpi),
        in_to_mm(f64::from(height) / dpi),
    )
}

/// Named size within `tolerance` millimeters of the given page, in either
/// orientation.
pub fn closest(width_mm: f64, height_mm: f64, tolerance: f64) -> Option<PaperSize> {
    let deviation = |size: &PaperSize| {
        let portrait = (size.width_mm() - width_mm)
            .abs()
            .max((size.height_mm() - height_mm).abs());
        let landscape = (size.height_mm() - width_mm)
            .abs()
            .max((size.width_mm() - height_mm).abs());

        portrait.min(landscape)
    };

    all_sorted()
        .into_iter()
        .map(|size| (deviation(&size), size))
        .filter(|(deviation, _)| *deviation <= tolerance)
        .min_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, size)| size)
}

/// Human readable page size of a scan, naming the paper size it matches.
pub fn describe_page(width: u32, height: u32, dpi: f64) -> String {
    let (width_mm, height_mm) = page_size_mm(width, height, dpi);

    match closest(width_mm, height_mm, 2.0) {
        Some(size) => format!("{:.1} x {:.1} mm ({})", width_mm, height_mm, size.name),
        None => format!("{:.1} x {:.1} mm", width_mm, height_mm),
    }
}

#[test]
fn iso_a_test() {
    let sizes = iso_a();

    assert_eq!(sizes.len(), 11);
    assert_eq!((sizes[0].width, sizes[0].height), (841.0, 1189.0));
    assert_eq!((sizes[4].width, sizes[4].height), (210.0, 297.0));
    assert_eq!(sizes[4].name, "A4");
    assert_eq!((sizes[10].width, sizes[10].height), (26.0, 37.0));
}

#[test]
fn conversion_test() {
    assert!((in_to_mm(1.0) - 25.4).abs() < 1e-9);
    assert!((mm_to_in(25.4) - 1.0).abs() < 1e-9);
    assert!((us()[0].width_mm() - 215.9).abs() < 1e-9);
}

#[test]
fn all_sorted_test() {
    let sizes = all_sorted();

    assert_eq!(sizes.len(), 14);
    assert_eq!(sizes[0].name, "A0");
    assert_eq!(sizes[13].name, "A10");
    assert!(sizes
        .windows(2)
        .all(|pair| pair[0].area_mm() >= pair[1].area_mm()));
}

#[test]
fn page_size_test() {
    // A4 at 300 dpi
    let (width, height) = page_size_mm(2480, 3508, 300.0);

    assert!((width - 209.97).abs() < 0.01);
    assert!((height - 297.01).abs() < 0.01);

    assert_eq!(closest(width, height, 2.0).unwrap().name, "A4");
    assert_eq!(closest(height, width, 2.0).unwrap().name, "A4");
    assert_eq!(closest(in_to_mm(8.5), in_to_mm(11.0), 1.0).unwrap().name, "US Letter");
    assert_eq!(closest(100.0, 100.0, 2.0), None);
}

#[test]
fn describe_page_test() {
    assert_eq!(describe_page(2480, 3508, 300.0), "210.0 x 297.0 mm (A4)");
    assert_eq!(describe_page(300, 300, 300.0), "25.4 x 25.4 mm");
}
