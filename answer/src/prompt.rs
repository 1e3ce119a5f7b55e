//! Prompt construction.
//!
//! The instruction block fixes the assistant's persona and rules. The rules
//! are enforced only through this text; the model's reply is not checked
//! against them beyond fallback detection in [`crate::citation`].

use lexsen_retrieval::DocumentChunk;

use crate::citation::FALLBACK_FR;

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// Instruction block sent before every question.
pub const LEGAL_ASSISTANT_TEMPLATE: &str = "
Tu es un assistant juridique spécialisé dans les textes de loi du Sénégal (Code de la famille, Code pénal, décrets, lois, etc).

Ta mission est de répondre de manière claire, concise et fiable à des questions posées par un utilisateur en t'appuyant exclusivement sur les extraits de documents juridiques suivants :

{context}

Consignes strictes :

- Réponds uniquement à partir du contenu fourni dans les extraits ci-dessus.
- Ne fais aucune supposition ni déduction en dehors des textes.
- N'invente jamais de références, de lois, ni de liens.
- Si l’information n’est pas présente, dis simplement : « {fallback} »
- Si la question est une salutation (bonjour, salut, etc.), réponds simplement avec une formule de politesse adaptée.
- Utilise un ton neutre, factuel et professionnel mais des réponses longues et explicatives.
- Réponds dans la langue de la question posée : français ou anglais.

---

Question : {question}

Réponse :
    ";

/// A template with `{context}` and `{question}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Use a custom template. It should contain both slots.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The Senegalese legal assistant template.
    pub fn legal_assistant() -> Self {
        Self::new(LEGAL_ASSISTANT_TEMPLATE.replace("{fallback}", FALLBACK_FR))
    }

    /// Fill the slots. Chunk bodies are joined verbatim with blank lines.
    ///
    /// The question is substituted last so text inside chunks that happens
    /// to read `{question}` is left alone.
    pub fn render(&self, chunks: &[DocumentChunk], question: &str) -> String {
        let context = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        match self.template.split_once(QUESTION_SLOT) {
            Some((head, tail)) if head.contains(CONTEXT_SLOT) => {
                format!("{}{question}{tail}", head.replacen(CONTEXT_SLOT, &context, 1))
            }
            Some((head, tail)) => {
                format!("{head}{question}{}", tail.replacen(CONTEXT_SLOT, &context, 1))
            }
            None => self.template.replacen(CONTEXT_SLOT, &context, 1),
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::legal_assistant()
    }
}
