use rive_data::model::{ObjectData, RiveDocument};
use std::fs::File;
use std::io::BufReader;

#[test]
fn test_parse_character() {
    let file = File::open("tests/character.json").expect("Failed to open character.json");
    let reader = BufReader::new(file);
    let res: Result<RiveDocument, _> = serde_json::from_reader(reader);
    let doc = match res {
        Ok(doc) => doc,
        Err(e) => panic!("Failed to parse character.json: {}", e),
    };

    let artboard = doc.artboard(Some("Character")).expect("Character artboard");
    let bones = artboard
        .objects
        .iter()
        .filter(|o| matches!(o, ObjectData::Bone(_)))
        .count();
    assert_eq!(bones, 6);

    let strokes: Vec<_> = artboard
        .objects
        .iter()
        .filter_map(|o| match o {
            ObjectData::Stroke(s) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0].parent, Some(8));
}
