use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

pub const PAGE_HEIGHT: f32 = 842.0;

/// One positioned string: text, x, and y measured from the top of the page.
pub type Placed<'a> = (&'a str, f32, f32);

pub fn create_positioned_pdf(
    path: &Path,
    pages: &[Vec<Placed<'_>>],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();

    for runs in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 9.into()]),
        ];
        for (text, x, y) in runs {
            operations.push(Operation::new("Tm", vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                (*x).into(),
                (PAGE_HEIGHT - *y).into(),
            ]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(path)?;
    Ok(())
}

/// Two-page English timetable using `#` as its only marker glyph.
pub fn sample_timetable_pages() -> Vec<Vec<Placed<'static>>> {
    vec![
        vec![
            ("Student Timetable", 50.0, 60.0),
            ("Name: Alice Chen", 50.0, 80.0),
            ("Student ID: S1029", 300.0, 80.0),
            ("2024-2025 Semester 1", 50.0, 100.0),
            ("Period", 50.0, 140.0),
            ("Section", 110.0, 140.0),
            ("Mon", 200.0, 140.0),
            ("Tue", 350.0, 140.0),
            ("1-2", 50.0, 170.0),
            ("1", 110.0, 170.0),
            ("#Intro to CS (1-2 Section) Week=1-3", 180.0, 170.0),
            ("@RoomA | Prof. Lee", 180.0, 185.0),
            ("3-4", 50.0, 210.0),
            ("3", 110.0, 210.0),
            ("#Robotics Week=4-6", 340.0, 210.0),
        ],
        vec![
            ("Period", 50.0, 60.0),
            ("Section", 110.0, 60.0),
            ("Mon", 200.0, 60.0),
            ("Tue", 350.0, 60.0),
            ("5-6", 50.0, 90.0),
            ("5", 110.0, 90.0),
            ("#Ethics (5-6 Section) Week=9-12 @Hall 3", 180.0, 90.0),
            ("Practice course: Field Training# Week:5-8", 50.0, 130.0),
        ],
    ]
}
