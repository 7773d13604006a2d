#![allow(missing_docs)]

use std::thread;

use keyedarchive::archive::{Archiver, FieldDecl, Format};
use keyedarchive::impl_record;

#[derive(Debug, Default, Clone, PartialEq)]
struct Inner {
	label: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Job {
	id: u32,
	inner: Inner,
	steps: Vec<Inner>,
}

impl_record!(Inner { label => FieldDecl::plain() });
impl_record!(Job {
	id => FieldDecl::plain(),
	inner => FieldDecl::plain(),
	steps => FieldDecl::plain(),
});

fn job(id: u32) -> Job {
	Job {
		id,
		inner: Inner { label: format!("job-{id}") },
		steps: (0..id % 4).map(|step| Inner { label: format!("step-{step}") }).collect(),
	}
}

#[test]
fn shared_archiver_round_trips_from_many_threads() {
	let archiver = Archiver::new();
	archiver.register_class::<Inner>("JobStep", &["JobStep", "NSObject"]);

	thread::scope(|scope| {
		for worker in 0..8_u32 {
			let archiver = &archiver;
			scope.spawn(move || {
				for round in 0..16 {
					let original = job(worker * 100 + round);
					let format = if round % 2 == 0 { Format::Binary } else { Format::Xml };
					let bytes = archiver.marshal(&original, format).expect("marshal job");
					let mut restored = Job::default();
					archiver.unmarshal_bytes(&bytes, &mut restored).expect("unmarshal job");
					assert_eq!(restored, original);
				}
			});
		}
	});

	let descriptor = archiver.describe::<Job>();
	assert_eq!(descriptor.fields.len(), 3);
	assert_eq!(archiver.classes().len(), 1);
}
