//! Record types shared by the integration tests

#![allow(dead_code)]

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use sheetmap::{HeaderMap, RecordDescriptor, StructRecord};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub salary: Option<f64>,
    pub active: bool,
    pub hired: Option<NaiveDateTime>,
    pub rating: Option<BigDecimal>,
}

static EMPLOYEE: Lazy<RecordDescriptor<Employee>> = Lazy::new(|| {
    RecordDescriptor::builder()
        .field("id", |e: &Employee| e.id, |e, v| e.id = v)
        .field("name", |e: &Employee| e.name.clone(), |e, v| e.name = v)
        .field("salary", |e: &Employee| e.salary, |e, v| e.salary = v)
        .field("active", |e: &Employee| e.active, |e, v| e.active = v)
        .field("hired", |e: &Employee| e.hired, |e, v| e.hired = v)
        .field("rating", |e: &Employee| e.rating.clone(), |e, v| e.rating = v)
        .build()
});

impl StructRecord for Employee {
    fn descriptor() -> &'static RecordDescriptor<Self> {
        &EMPLOYEE
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn employees() -> Vec<Employee> {
    vec![
        Employee {
            id: 1,
            name: "Ann".into(),
            salary: Some(5200.5),
            active: true,
            hired: Some(date(2019, 3, 1)),
            rating: Some("4.50".parse().unwrap()),
        },
        Employee {
            id: 2,
            name: "Bo".into(),
            salary: None,
            active: false,
            hired: None,
            rating: None,
        },
        Employee {
            id: 123_457_000_000_000_000,
            name: "Cy Young".into(),
            salary: Some(0.1),
            active: true,
            hired: Some(date(2024, 2, 29)),
            rating: Some("3".parse().unwrap()),
        },
    ]
}

/// Writing columns: id, name, salary, active, hired, rating
pub fn write_map() -> HeaderMap {
    HeaderMap::for_writing::<Employee>().unwrap()
}

/// Reading orientation of the same columns
pub fn read_map() -> HeaderMap {
    HeaderMap::for_reading::<Employee>().unwrap()
}
