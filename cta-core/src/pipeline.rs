//! # Pipeline de Análise: Orquestrador com Eventos Observáveis
//!
//! O pipeline executa as quatro análises sobre um manuscrito já carregado
//! (sinais, palavras, glossário e exportação ORACC) e emite um evento ao fim
//! de cada etapa via um canal Rust (`mpsc`), permitindo que o servidor
//! WebSocket transmita o progresso para o cliente.
//!
//! Nenhuma etapa altera o manuscrito, então manuscritos independentes podem ser
//! analisados em paralelo ([`CtaPipeline::analyze_many`], com `rayon`).

use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AnalysisConfig, OraccOptions};
use crate::glossary::{build_glossary, Glossary};
use crate::manuscript::Manuscript;
use crate::oracc::{export_oracc, OraccExport};
use crate::signs::{analyse_signs, line_length_stats, LineLengthStats, SignAnalysis};
use crate::words::{analyse_words, word_table, WordAnalysis, WordRow};

/// Eventos emitidos pelo pipeline durante o processamento.
///
/// Cada etapa concluída carrega o seu resultado completo, para que a UI possa
/// renderizá-lo assim que chega.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Início**: tamanho do manuscrito recebido.
    Started {
        sections: usize,
        lines: usize,
    },
    /// **Etapa 1**: contagem de sinais e comprimento das linhas preservadas.
    SignsAnalysed {
        analysis: SignAnalysis,
        line_lengths: Option<LineLengthStats>,
    },
    /// **Etapa 2**: formas por estado de preservação e tabela de apresentação.
    WordsAnalysed {
        analysis: WordAnalysis,
        table: Vec<WordRow>,
    },
    /// **Etapa 3**: glossário de formas atestadas.
    GlossaryBuilt {
        glossary: Glossary,
    },
    /// **Etapa 4**: documento ATF e erros por linha.
    OraccExported {
        export: OraccExport,
    },
    /// **Conclusão**: resumo dos diagnósticos e tempo total.
    Done {
        syntax_errors: usize,
        oracc_errors: usize,
        processing_ms: u64,
    },
}

/// Resultado das quatro análises de um manuscrito.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManuscriptReport {
    pub signs: SignAnalysis,
    pub line_lengths: Option<LineLengthStats>,
    pub words: WordAnalysis,
    pub word_table: Vec<WordRow>,
    pub glossary: Glossary,
    pub oracc: OraccExport,
}

/// O pipeline de análise.
///
/// # Modos de Uso
/// - **Sync**: [`CtaPipeline::analyze`] para scripts e chamadas diretas.
/// - **Streaming**: [`CtaPipeline::analyze_streaming`] para UIs reativas (via WebSocket).
/// - **Lote**: [`CtaPipeline::analyze_many`] para vários manuscritos em paralelo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaPipeline {
    #[serde(default)]
    pub config: AnalysisConfig,
    #[serde(default)]
    pub oracc: OraccOptions,
}

impl CtaPipeline {
    /// Cria o pipeline com as opções padrão.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(config: AnalysisConfig, oracc: OraccOptions) -> Self {
        Self { config, oracc }
    }

    pub fn analyse_signs(&self, manuscript: &Manuscript) -> SignAnalysis {
        analyse_signs(manuscript)
    }

    pub fn analyse_words(&self, manuscript: &Manuscript) -> WordAnalysis {
        analyse_words(manuscript, self.config.word_double_readings)
    }

    pub fn build_glossary(&self, manuscript: &Manuscript) -> Glossary {
        build_glossary(manuscript, self.config.glossary_double_readings)
    }

    pub fn export_oracc(&self, manuscript: &Manuscript) -> OraccExport {
        export_oracc(manuscript, &self.oracc)
    }

    /// Executa as quatro análises de forma síncrona e devolve o relatório.
    pub fn analyze(&self, manuscript: &Manuscript) -> ManuscriptReport {
        let (tx, rx) = mpsc::channel();
        self.analyze_streaming(manuscript, tx);

        let mut report = ManuscriptReport::default();
        // Consome todos os eventos até o fim
        while let Ok(event) = rx.recv() {
            match event {
                PipelineEvent::SignsAnalysed { analysis, line_lengths } => {
                    report.signs = analysis;
                    report.line_lengths = line_lengths;
                }
                PipelineEvent::WordsAnalysed { analysis, table } => {
                    report.words = analysis;
                    report.word_table = table;
                }
                PipelineEvent::GlossaryBuilt { glossary } => report.glossary = glossary,
                PipelineEvent::OraccExported { export } => report.oracc = export,
                PipelineEvent::Started { .. } | PipelineEvent::Done { .. } => {}
            }
        }
        report
    }

    /// Executa o pipeline enviando um evento ao fim de cada etapa.
    ///
    /// # Fluxo de Eventos
    /// 1. `Started`
    /// 2. `SignsAnalysed`
    /// 3. `WordsAnalysed`
    /// 4. `GlossaryBuilt`
    /// 5. `OraccExported`
    /// 6. `Done`
    ///
    /// Um receptor que desistiu não interrompe a análise.
    pub fn analyze_streaming(&self, manuscript: &Manuscript, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();

        let _ = tx.send(PipelineEvent::Started {
            sections: manuscript.sections.len(),
            lines: manuscript.tokenized_lines().count(),
        });

        let signs = self.analyse_signs(manuscript);
        let syntax_errors = signs.errors.len();
        let _ = tx.send(PipelineEvent::SignsAnalysed {
            analysis: signs,
            line_lengths: line_length_stats(manuscript),
        });

        let words = self.analyse_words(manuscript);
        let table = word_table(&words);
        let _ = tx.send(PipelineEvent::WordsAnalysed {
            analysis: words,
            table,
        });

        let _ = tx.send(PipelineEvent::GlossaryBuilt {
            glossary: self.build_glossary(manuscript),
        });

        let export = self.export_oracc(manuscript);
        let oracc_errors = export.errors.len();
        let _ = tx.send(PipelineEvent::OraccExported { export });

        let processing_ms = start.elapsed().as_millis() as u64;
        debug!(syntax_errors, oracc_errors, processing_ms, "pipeline concluído");
        let _ = tx.send(PipelineEvent::Done {
            syntax_errors,
            oracc_errors,
            processing_ms,
        });
    }

    /// Analisa manuscritos independentes em paralelo, preservando a ordem de entrada.
    pub fn analyze_many(&self, manuscripts: &[Manuscript]) -> Vec<ManuscriptReport> {
        manuscripts
            .par_iter()
            .map(|manuscript| self.analyze(manuscript))
            .collect()
    }
}
