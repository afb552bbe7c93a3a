use std::io::{self, Write};
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::ParseError;
use crate::model::ParsedCourse;

const HEADERS: [&str; 8] = [
    "day", "name", "periods", "weeks", "location", "teacher", "type", "outside",
];

fn join_numbers(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn write_courses<W: Write>(
    writer: &mut Writer<W>,
    courses: &[ParsedCourse],
) -> Result<(), ParseError> {
    writer.write_record(HEADERS)?;
    for course in courses {
        writer.write_record([
            course.day.map(|day| day.as_str()).unwrap_or_default(),
            course.name.as_deref().unwrap_or_default(),
            join_numbers(&course.periods).as_str(),
            join_numbers(&course.weeks).as_str(),
            course.location.as_deref().unwrap_or_default(),
            course.teacher.as_deref().unwrap_or_default(),
            course.course_type.as_deref().unwrap_or_default(),
            if course.outside { "true" } else { "false" },
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn write_csv(path: &Path, courses: &[ParsedCourse]) -> Result<(), ParseError> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    write_courses(&mut writer, courses)
}

pub(crate) fn write_csv_to_string(courses: &[ParsedCourse]) -> Result<String, ParseError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::<u8>::new());
    write_courses(&mut writer, courses)?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ParseError::Csv(error.into_error().into()))?;
    utf8_output(bytes)
}

fn utf8_output(bytes: Vec<u8>) -> Result<String, ParseError> {
    String::from_utf8(bytes)
        .map_err(|error| ParseError::Io(io::Error::new(io::ErrorKind::InvalidData, error)))
}
