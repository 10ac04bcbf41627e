//! Archive fixtures shared by the command tests.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

pub(crate) const PUBLICATION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CompteRendu>
  <Metadonnees>
    <PublicationNumero>4</PublicationNumero>
    <DateSeance>Mardi-04-01-Janvier-2022</DateSeance>
    <LegislatureNumero>15</LegislatureNumero>
  </Metadonnees>
  <Contenu>
    <Section>
      <TitreStruct Ident="S1"><Intitule>Questions au Gouvernement</Intitule></TitreStruct>
      <Para idsyceron="1001"><Orateurs><Orateur><Nom>M. le président</Nom></Orateur></Orateurs>. La séance est ouverte.</Para>
      <Para idsyceron="1002"><Orateurs><Orateur><Nom>M. Thomas Mesnier</Nom></Orateur></Orateurs>. Ma question.</Para>
      <Para idsyceron="1002">La suite de ma question.</Para>
      <Para idsyceron="1003">   </Para>
    </Section>
  </Contenu>
</CompteRendu>
"#;

pub(crate) const EMPTY_PUBLICATION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CompteRendu>
  <Metadonnees><PublicationNumero>5</PublicationNumero></Metadonnees>
  <Contenu><Section><TitreStruct><Intitule>Ordre du jour</Intitule></TitreStruct></Section></Contenu>
</CompteRendu>
"#;

fn tar_with(name: &str, data: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, name, data).unwrap();
    builder.into_inner().unwrap()
}

/// Outer gzip tar holding an inner tar holding the `CRI_` payload.
pub(crate) fn taz(payload: &str) -> Vec<u8> {
    let inner = tar_with("CRI_20220004.xml", payload.as_bytes());
    let outer = tar_with("AN_2022004.tar", &inner);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&outer).unwrap();
    encoder.finish().unwrap()
}
