use bytes::Bytes;
use rand::seq::SliceRandom;
use rand::Rng;

use dns_types::protocol::types::*;

#[test]
fn roundtrip_message() {
    for _ in 0..100 {
        let original = arbitrary_message();
        let octets = original.to_octets().unwrap();
        let deserialised = Message::from_octets(&octets);

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_message_with_edns() {
    for _ in 0..100 {
        let mut original = arbitrary_message();
        original.edns = Some(Edns {
            payload_size: rand::thread_rng().gen(),
            version: 0,
            dnssec_ok: rand::thread_rng().gen(),
            options: vec![EdnsOption {
                code: rand::thread_rng().gen(),
                data: arbitrary_octets(8),
            }],
        });

        let octets = original.to_octets().unwrap();
        let deserialised = Message::from_octets(&octets);

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_resourcerecord() {
    let registry = dns_types::protocol::registry::current();

    for _ in 0..100 {
        let original = arbitrary_resourcerecord();

        let mut buffer = dns_types::protocol::serialise::WritableBuffer::default();
        original.serialise(&mut buffer, true).unwrap();
        let deserialised = ResourceRecord::deserialise(
            0,
            &mut dns_types::protocol::deserialise::ConsumableBuffer::new(&buffer.octets),
            &registry,
        );

        assert_eq!(Ok(original), deserialised);
    }
}

#[test]
fn roundtrip_text() {
    for _ in 0..100 {
        let original = arbitrary_resourcerecord().rtype_with_data;
        let text = original.serialise_text();
        let tokens = dns_types::protocol::text::tokenise(&text).unwrap();
        let token_refs = tokens.iter().map(String::as_str).collect::<Vec<&str>>();
        let deserialised = RecordTypeWithData::deserialise_text(
            original.rtype(),
            &token_refs,
            &DomainName::root_domain(),
        );

        assert_eq!(Ok(original), deserialised, "text was: {text}");
    }
}

fn arbitrary_message() -> Message {
    let mut rng = rand::thread_rng();

    let mut message = Message::from_question(
        rng.gen(),
        Question {
            name: arbitrary_domainname(),
            qtype: QueryType::Record(RecordType::A),
            qclass: QueryClass::Record(RecordClass::IN),
        },
    );
    message.header.is_response = rng.gen();
    message.header.is_authoritative = rng.gen();
    message.header.recursion_desired = rng.gen();
    message.header.recursion_available = rng.gen();
    message.header.authentic_data = rng.gen();
    message.header.checking_disabled = rng.gen();
    message.header.rcode = Rcode::from(u16::from(rng.gen::<u8>() & 0b1111));

    for _ in 0..rng.gen_range(0..4) {
        message.answers.push(arbitrary_resourcerecord());
    }
    for _ in 0..rng.gen_range(0..4) {
        message.authority.push(arbitrary_resourcerecord());
    }
    for _ in 0..rng.gen_range(0..4) {
        message.additional.push(arbitrary_resourcerecord());
    }

    message
}

fn arbitrary_resourcerecord() -> ResourceRecord {
    let mut rng = rand::thread_rng();

    // a cross-section of the catalog: names (compressible and not),
    // addresses, counted strings, bitmaps, and opaque payloads
    let rtype_with_data = match rng.gen_range(0..12) {
        0 => RecordTypeWithData::A {
            address: rng.gen::<u32>().into(),
        },
        1 => RecordTypeWithData::AAAA {
            address: rng.gen::<u128>().into(),
        },
        2 => RecordTypeWithData::CNAME {
            cname: arbitrary_domainname(),
        },
        3 => RecordTypeWithData::SOA {
            mname: arbitrary_domainname(),
            rname: arbitrary_domainname(),
            serial: rng.gen(),
            refresh: rng.gen(),
            retry: rng.gen(),
            expire: rng.gen(),
            minimum: rng.gen(),
        },
        4 => RecordTypeWithData::MX {
            preference: rng.gen(),
            exchange: arbitrary_domainname(),
        },
        5 => RecordTypeWithData::TXT {
            strings: vec![arbitrary_octets(12), arbitrary_octets(3)],
        },
        6 => RecordTypeWithData::SRV {
            priority: rng.gen(),
            weight: rng.gen(),
            port: rng.gen(),
            target: arbitrary_domainname(),
        },
        7 => RecordTypeWithData::DS {
            key_tag: rng.gen(),
            algorithm: rng.gen(),
            digest_type: rng.gen(),
            digest: arbitrary_octets(20),
        },
        8 => RecordTypeWithData::RRSIG {
            signature: Signature {
                type_covered: RecordType::from(rng.gen_range(1..66)),
                algorithm: rng.gen(),
                labels: rng.gen(),
                original_ttl: rng.gen(),
                expiration: rng.gen(),
                inception: rng.gen(),
                key_tag: rng.gen(),
                signer: arbitrary_domainname(),
                signature: arbitrary_octets(16),
            },
        },
        9 => {
            let mut codes = (0..rng.gen_range(1..6))
                .map(|_| rng.gen::<u16>())
                .collect::<Vec<u16>>();
            codes.sort_unstable();
            codes.dedup();
            RecordTypeWithData::NSEC {
                next: arbitrary_domainname(),
                types: codes.into_iter().map(RecordType::from).collect(),
            }
        }
        10 => RecordTypeWithData::HTTPS {
            priority: rng.gen(),
            target: arbitrary_domainname(),
            params: vec![SvcParam {
                key: rng.gen(),
                value: arbitrary_octets(6),
            }],
        },
        // every code in 66..256 is outside the built-in catalog
        _ => match RecordType::from(rng.gen_range(66..256)) {
            RecordType::Unknown(tag) => RecordTypeWithData::Unknown {
                tag,
                octets: arbitrary_octets(10),
            },
            _ => unreachable!(),
        },
    };

    ResourceRecord {
        name: arbitrary_domainname(),
        rtype_with_data,
        rclass: RecordClass::IN,
        ttl: rand::thread_rng().gen(),
    }
}

fn arbitrary_domainname() -> DomainName {
    let mut rng = rand::thread_rng();

    // share labels across names so compression actually happens
    let words: &[&str] = &["alpha", "bravo", "charlie", "example", "net", "com"];
    let num_labels = rng.gen_range(1..4);
    let mut name = String::new();
    for _ in 0..num_labels {
        name.push_str(words.choose(&mut rng).unwrap());
        name.push('.');
    }

    DomainName::from_dotted_string(&name).unwrap()
}

fn arbitrary_octets(len: usize) -> Bytes {
    let mut rng = rand::thread_rng();
    let mut octets = Vec::with_capacity(len);
    for _ in 0..len {
        octets.push(rng.gen());
    }
    Bytes::from(octets)
}
