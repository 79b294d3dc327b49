use seqsieve_align::BandedAligner;
use seqsieve_seq::scoring::SubstitutionMatrix;
use seqsieve_seq::Alphabet;

fn wide(query: &[u8], target: &[u8]) -> usize { query.len().max(target.len()) }

#[test]
fn identical_sequences_align_end_to_end() {

    let matrix = SubstitutionMatrix::blosum62();
    let alphabet = Alphabet::new();
    let mut aligner = BandedAligner::new(&matrix, -11, -1);

    let q = alphabet.encode(b"MKTII");
    let alignment = aligner.align(&q, &q, 0, wide(&q, &q)).unwrap();
    assert_eq!(alignment.score, 23);
    assert_eq!(alignment.backtrace, "MMMMM");
    assert_eq!(alignment.n_identical, 5);
    assert_eq!(alignment.alignment_length, 5);
    assert_eq!((alignment.query_start, alignment.query_end), (0, 4));
    assert_eq!((alignment.target_start, alignment.target_end), (0, 4));
    assert_eq!(alignment.gap_opens, 0);
}

#[test]
fn local_alignment_finds_the_embedded_substring() {

    let matrix = SubstitutionMatrix::blosum62();
    let alphabet = Alphabet::new();
    let mut aligner = BandedAligner::new(&matrix, -11, -1);

    let q = alphabet.encode(b"KTI");
    let t = alphabet.encode(b"MKTII");
    let alignment = aligner.align(&q, &t, 0, wide(&q, &t)).unwrap();
    assert_eq!(alignment.score, 14);
    assert_eq!(alignment.backtrace, "MMM");
    assert_eq!((alignment.query_start, alignment.query_end), (0, 2));
    assert_eq!((alignment.target_start, alignment.target_end), (1, 3));
}

#[test]
fn affine_gaps_bridge_an_insertion() {

    let matrix = SubstitutionMatrix::blosum62();
    let alphabet = Alphabet::new();
    // --- cheap gaps so that bridging the PPP insertion beats the gapless MKT core
    let mut aligner = BandedAligner::new(&matrix, -4, -1);

    let q = alphabet.encode(b"MKTPPPIL");
    let t = alphabet.encode(b"MKTIL");
    let alignment = aligner.align(&q, &t, 0, wide(&q, &t)).unwrap();
    assert_eq!(alignment.score, 17);
    assert_eq!(alignment.backtrace, "MMMIIIMM");
    assert_eq!(alignment.gap_opens, 1);
    assert_eq!(alignment.gap_extends, 2);
    assert_eq!(alignment.n_identical, 5);
    assert_eq!(alignment.alignment_length, 8);
    assert_eq!((alignment.query_start, alignment.query_end), (0, 7));
    assert_eq!((alignment.target_start, alignment.target_end), (0, 4));
}

#[test]
fn the_band_constrains_what_can_be_found() {

    let matrix = SubstitutionMatrix::blosum62();
    let alphabet = Alphabet::new();
    let mut aligner = BandedAligner::new(&matrix, -11, -1);

    let q = alphabet.encode(b"AAAA");
    let t = alphabet.encode(b"GGGGAAAA");

    // --- the real alignment lies on diagonal -4, outside a narrow band around 0
    let narrow = aligner.align(&q, &t, 0, 1).unwrap();
    assert_eq!(narrow.score, 4);

    // --- centering the band on the prefilter diagonal recovers it even at width 0
    let centered = aligner.align(&q, &t, -4, 0).unwrap();
    assert_eq!(centered.score, 16);
    assert_eq!(centered.backtrace, "MMMM");
    assert_eq!((centered.target_start, centered.target_end), (4, 7));

    // --- a wide band finds it too
    let full = aligner.align(&q, &t, 0, wide(&q, &t)).unwrap();
    assert_eq!(full.score, 16);
}

#[test]
fn hopeless_pairs_produce_no_alignment() {

    let matrix = SubstitutionMatrix::blosum62();
    let alphabet = Alphabet::new();
    let mut aligner = BandedAligner::new(&matrix, -11, -1);

    // --- W against P scores -4; nothing positive exists
    let q = alphabet.encode(b"WWWW");
    let t = alphabet.encode(b"PPPP");
    assert!(aligner.align(&q, &t, 0, wide(&q, &t)).is_none());
    assert!(aligner.align(&q, b"", 0, 4).is_none());
}
