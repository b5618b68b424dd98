use sqlpack::{
    EmptyRowPolicy, PackError, PackOptions, StatementPacker, Template, build_statements,
    build_tuple, escape, unescape,
};

const T: &str = "INSERT INTO t VALUES";

/// Parse the tuples back out of a statement produced with template `template`.
fn parse_tuples(statement: &str, template: &str) -> Vec<Vec<String>> {
    let body = statement
        .strip_prefix(template)
        .expect("statement starts with template");
    let mut chars = body.chars();
    let mut rows = Vec::new();

    loop {
        assert_eq!(chars.next(), Some('('), "tuple opens with (");
        let mut row = Vec::new();
        loop {
            assert_eq!(chars.next(), Some('\''), "field opens with quote");
            let mut field = String::new();
            loop {
                match chars.next().expect("unterminated field") {
                    '\\' => field.push(chars.next().expect("dangling escape")),
                    '\'' => break,
                    c => field.push(c),
                }
            }
            row.push(field);
            match chars.next() {
                Some(',') => continue,
                Some(')') => break,
                other => panic!("unexpected {other:?} after field"),
            }
        }
        rows.push(row);
        match chars.next() {
            Some(',') => continue,
            None => break,
            other => panic!("unexpected {other:?} after tuple"),
        }
    }
    rows
}

/// Small deterministic generator so the property checks are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> usize {
        (self.next() % n) as usize
    }
}

const ALPHABET: &[char] = &[
    'a', 'b', 'z', '0', '9', ' ', ',', '(', ')', '\\', '\0', '\r', '\n', '\x1A', '\'', '"', 'é',
    '世', '🦀',
];

fn random_rows(rng: &mut Lcg, count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|_| {
            let arity = 1 + rng.below(6);
            (0..arity)
                .map(|_| {
                    let len = rng.below(40);
                    (0..len)
                        .map(|_| ALPHABET[rng.below(ALPHABET.len() as u64)])
                        .collect()
                })
                .collect()
        })
        .collect()
}

#[test]
fn scenario_a_single_row() {
    let stmts = build_statements([["a", "b", "c"]], T, 2048, &PackOptions::default()).unwrap();
    assert_eq!(stmts, ["INSERT INTO t VALUES('a','b','c')"]);
}

#[test]
fn scenario_b_three_tuples_per_statement() {
    // template 20 bytes, tuple 29 bytes: three tuples make 109 bytes, a fourth would need 139
    let rows = vec![vec!["1", "product", "description"]; 5];
    let opts = PackOptions::default().with_byte_limit_range_check(false);

    for limit in [110, 120, 139] {
        let stmts = build_statements(&rows, T, limit, &opts).unwrap();
        assert_eq!(stmts.len(), 2, "limit {limit}");
        assert_eq!(parse_tuples(&stmts[0], T).len(), 3);
        assert_eq!(parse_tuples(&stmts[1], T).len(), 2);
        assert!(stmts.iter().all(|s| s.len() <= limit));
    }

    let stmts = build_statements(&rows, T, 120, &opts).unwrap();
    assert_eq!(
        stmts[1],
        "INSERT INTO t VALUES('1','product','description'),('1','product','description')"
    );
}

#[test]
fn scenario_c_empty_input() {
    let rows: Vec<Vec<String>> = vec![];
    assert_eq!(
        build_statements(&rows, T, 2048, &PackOptions::default()),
        Err(PackError::EmptyInput)
    );
}

#[test]
fn scenario_d_oversized_single_row() {
    let long = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Cras nec metus.";
    let rows = vec![vec![long; 20]];
    let err = build_statements(&rows, T, 1024, &PackOptions::default()).unwrap_err();
    assert!(err.is_oversized_row());
    assert!(matches!(
        err,
        PackError::OversizedSingleRow { index: 0, limit: 1024, len } if len > 1024
    ));
}

#[test]
fn scenario_e_quote_and_backslash() {
    assert_eq!(
        build_tuple(&["O'Brien\\path"]).unwrap(),
        r"('O\'Brien\\path')"
    );
}

#[test]
fn long_rows_split_at_the_packet_limit() {
    let long = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Cras nec metus.";
    let rows = vec![vec![long; 3]; 5];
    let template = Template::replace_into("foo").unwrap();
    let stmts = StatementPacker::new(template.clone(), 1024).pack(&rows).unwrap();

    // each tuple is 226 bytes and the template 26: four tuples fit in 1024
    let tuple = format!("('{long}','{long}','{long}')");
    assert_eq!(
        stmts,
        [
            format!("{template}{tuple},{tuple},{tuple},{tuple}"),
            format!("{template}{tuple}"),
        ]
    );
}

#[test]
fn too_small_packet_is_rejected_up_front() {
    let rows = vec![vec!["a", "b", "c"]; 5];
    let err = build_statements(&rows, "REPLACE INTO `foo` VALUES", 32, &PackOptions::default())
        .unwrap_err();
    assert!(err.is_invalid_byte_limit());
}

#[test]
fn empty_rows_under_both_policies() {
    let rows = vec![vec!["a", "b", "c"], vec![], vec!["a", "b", "c"]];

    let err = build_statements(&rows, T, 1024, &PackOptions::default()).unwrap_err();
    assert_eq!(err, PackError::EmptyRow { index: 1 });

    let stmts = StatementPacker::new(T, 1024)
        .on_empty_row(EmptyRowPolicy::Skip)
        .pack(&rows)
        .unwrap();
    assert_eq!(stmts, ["INSERT INTO t VALUES('a','b','c'),('a','b','c')"]);
}

#[test]
fn escape_round_trips_critical_characters() {
    let critical = ['\\', '\0', '\r', '\n', '\x1A', '\'', '"'];
    let mut rng = Lcg(7);
    for _ in 0..200 {
        let len = rng.below(16);
        let field: String = (0..len)
            .map(|_| critical[rng.below(critical.len() as u64)])
            .collect();
        let escaped = escape(&field);
        assert_eq!(escaped.len(), field.len() * 2, "every char is escaped");
        assert!(escaped
            .as_bytes()
            .chunks(2)
            .all(|pair| pair[0] == b'\\'));
        assert_eq!(unescape(&escaped), field);
    }
}

#[test]
fn tuple_has_one_top_level_comma_per_field_gap() {
    let mut rng = Lcg(11);
    for row in random_rows(&mut rng, 100) {
        let tuple = build_tuple(&row).unwrap();
        assert!(tuple.starts_with('('));
        assert!(tuple.ends_with(')'));

        // count commas outside quoted literals
        let mut in_literal = false;
        let mut escaped = false;
        let mut commas = 0;
        for c in tuple.chars() {
            match (in_literal, escaped, c) {
                (true, true, _) => escaped = false,
                (true, false, '\\') => escaped = true,
                (_, false, '\'') => in_literal = !in_literal,
                (false, _, ',') => commas += 1,
                _ => {}
            }
        }
        assert_eq!(commas, row.len() - 1, "row {row:?}");
    }
}

#[test]
fn statements_cover_rows_in_order_within_limit() {
    let mut rng = Lcg(42);
    let opts = PackOptions::default().with_byte_limit_range_check(false);

    for round in 0..50 {
        let count = 1 + rng.below(60);
        let rows = random_rows(&mut rng, count);
        let limit = 300 + rng.below(2000);
        let stmts = match build_statements(&rows, T, limit, &opts) {
            Ok(stmts) => stmts,
            Err(PackError::OversizedSingleRow { .. }) => continue,
            Err(e) => panic!("round {round}: {e}"),
        };

        assert!(!stmts.is_empty());
        let mut rebuilt = Vec::new();
        for s in &stmts {
            assert!(s.len() <= limit, "round {round}: {} > {limit}", s.len());
            let tuples = parse_tuples(s, T);
            assert!(!tuples.is_empty());
            rebuilt.extend(tuples);
        }
        assert_eq!(rebuilt, rows, "round {round}");
    }
}

#[test]
fn greedy_packing_leaves_no_room_for_the_next_row() {
    let mut rng = Lcg(99);
    let opts = PackOptions::default().with_byte_limit_range_check(false);
    let rows = random_rows(&mut rng, 200);
    let limit = 1500;
    let stmts = build_statements(&rows, T, limit, &opts).unwrap();

    // each closed statement must have been unable to take the following tuple
    let mut next_row = 0;
    for pair in stmts.windows(2) {
        next_row += parse_tuples(&pair[0], T).len();
        let next_tuple = build_tuple(&rows[next_row]).unwrap();
        assert!(pair[0].len() + 1 + next_tuple.len() + 1 > limit);
    }
}

#[test]
fn chunked_packing_matches_per_chunk_calls() {
    let mut rng = Lcg(5);
    let rows = random_rows(&mut rng, 45);
    let packer = StatementPacker::new(T, 2048);

    let chunked: Vec<Vec<String>> = packer
        .chunks(&rows, 10)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(chunked.len(), 5);
    for (i, chunk) in chunked.iter().enumerate() {
        let end = (i * 10 + 10).min(rows.len());
        assert_eq!(chunk, &packer.pack(&rows[i * 10..end]).unwrap());
    }
}

#[test]
fn chunked_packing_stops_when_dropped() {
    let rows = vec![vec!["x"]; 100];
    let packer = StatementPacker::new(T, 2048);
    let cancelled_after = 3;
    let mut done = 0;
    for chunk in packer.chunks(&rows, 10) {
        chunk.unwrap();
        done += 1;
        if done == cancelled_after {
            break;
        }
    }
    assert_eq!(done, 3);
}

#[test]
fn chunked_packing_with_skipped_rows_matches_pack() {
    let packer = StatementPacker::new(T, 2048).on_empty_row(EmptyRowPolicy::Skip);
    let empty: Vec<&str> = Vec::new();

    // all-empty middle chunk, then all-empty first chunk
    let layouts = [
        vec![vec!["a"], vec!["b"], empty.clone(), empty.clone(), vec!["c"]],
        vec![empty.clone(), empty.clone(), vec!["a"], vec!["b"], vec!["c"]],
    ];
    for rows in layouts {
        let chunked: Vec<String> = packer
            .chunks(&rows, 2)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        let tuples: Vec<Vec<String>> = chunked.iter().flat_map(|s| parse_tuples(s, T)).collect();
        assert_eq!(tuples, vec![vec!["a"], vec!["b"], vec!["c"]], "{rows:?}");
        assert_eq!(
            packer.pack(&rows).unwrap(),
            ["INSERT INTO t VALUES('a'),('b'),('c')"]
        );
    }
}

#[test]
fn chunked_packing_of_only_skipped_rows_is_empty_input() {
    let rows: Vec<Vec<&str>> = vec![Vec::new(); 5];
    let packer = StatementPacker::new(T, 2048).on_empty_row(EmptyRowPolicy::Skip);

    let mut it = packer.chunks(&rows, 2);
    assert_eq!(it.next(), Some(Err(PackError::EmptyInput)));
    assert!(it.next().is_none());
    assert_eq!(packer.pack(&rows), Err(PackError::EmptyInput));
}
